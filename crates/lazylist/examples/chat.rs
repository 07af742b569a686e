//! Simulated chat history driven through the list manager.
//!
//! A scripted message store plays the role of a slow backend: each load
//! sleeps briefly before answering, the way a database or network API would.
//! The "render loop" below is a plain terminal print of the visible window,
//! scrolling upward through history so the prefetch policy keeps requesting
//! older pages.
//!
//! Run with: cargo run -p lazylist --example chat

use std::thread;
use std::time::Duration;

use lazylist::{
    Direction, Element, Hooks, ListConfig, Loaded, Manager, Serial, Stickiness, Viewport,
};

#[derive(Clone, Debug)]
enum Row {
    Message { id: u32, author: &'static str, body: String },
    DayBoundary { day: u32 },
}

impl Element for Row {
    fn serial(&self) -> Serial {
        match self {
            Row::Message { id, .. } => Serial::from(format!("msg-{id}")),
            Row::DayBoundary { .. } => Serial::none(),
        }
    }
}

/// Backend of 60 messages, ten per "day", paged in batches of 8.
fn load_page(direction: Direction, relative_to: &Serial) -> Loaded<Row> {
    thread::sleep(Duration::from_millis(30));

    let newest = 60u32;
    let anchor: u32 = relative_to
        .as_str()
        .strip_prefix("msg-")
        .and_then(|id| id.parse().ok())
        .unwrap_or(newest + 1);

    let make = |id: u32| Row::Message {
        id,
        author: if id % 3 == 0 { "ada" } else { "lin" },
        body: format!("message number {id}"),
    };

    match direction {
        Direction::Before => {
            let end = anchor.saturating_sub(1).min(newest);
            let start = end.saturating_sub(7).max(1);
            if end == 0 {
                return Loaded::end(Vec::new());
            }
            let batch = (start..=end).map(make).collect();
            Loaded {
                elements: batch,
                has_more: start > 1,
            }
        }
        Direction::After => {
            // The newest page; nothing ever appears past it in this demo.
            let start = newest.saturating_sub(7);
            Loaded::end((start..=newest).map(make).collect())
        }
    }
}

fn main() {
    let hooks = Hooks::new(load_page, |row: &Row, state: Option<&mut u32>| match row {
        Row::Message { author, body, .. } => {
            let views = state.map_or(0, |v| {
                *v += 1;
                *v
            });
            format!("  <{author}> {body}  (rendered {views}x)")
        }
        Row::DayBoundary { day } => format!("── day {day} ──"),
    })
    .with_allocator(|row: &Row| match row {
        Row::Message { .. } => Some(0u32),
        Row::DayBoundary { .. } => None,
    })
    .with_synthesizer(|prev: Option<&Row>, cur: &Row, _| {
        // Insert a day boundary whenever the day changes.
        let day_of = |row: &Row| match row {
            Row::Message { id, .. } => id / 10,
            Row::DayBoundary { day } => *day,
        };
        match cur {
            Row::Message { .. }
                if prev.is_none_or(|p| day_of(p) != day_of(cur)) =>
            {
                vec![Row::DayBoundary { day: day_of(cur) }, cur.clone()]
            }
            _ => vec![cur.clone()],
        }
    });

    let config = ListConfig::default().with_stickiness(Stickiness::After);
    let mut manager: Manager<Row, u32, String> = Manager::new(config, hooks);
    let mut viewport = Viewport::new(0, 4);

    // Frame loop: drain, render the visible window, let the policy prefetch,
    // then scroll one row toward older history.
    for frame in 0..40 {
        let len = manager.updated_len(&mut viewport);
        println!("frame {frame:2}  len {len:3}  first {}", viewport.first);
        let start = viewport.first.max(0) as usize;
        for index in start..(start + viewport.visible).min(len) {
            if let Some(line) = manager.present(index) {
                println!("{line}");
            }
        }

        manager.evaluate_viewport(viewport);
        if viewport.first > 0 {
            viewport.first -= 1;
        }
        thread::sleep(Duration::from_millis(15));
    }

    // A local edit: the host rewrites one message in place.
    manager.modify(
        vec![Row::Message {
            id: 58,
            author: "ada",
            body: "message number 58 (edited)".into(),
        }],
        &[Serial::from("msg-58")],
        &[],
    );
    let len = manager.updated_len(&mut viewport);
    println!("after edit: len {len}, {:#?}", manager.stats());

    manager.shutdown();
}
