#![forbid(unsafe_code)]

//! Background load worker.
//!
//! One worker thread per manager. It blocks on the request channel, runs the
//! loader (which may itself block for as long as it likes), merges the batch
//! into the snapshot carried by the request, synthesizes the replacement
//! display sequence, and hands the finished [`StateUpdate`] back over the
//! result channel. The frame thread never waits on any of this: it enqueues
//! requests and drains results without blocking.
//!
//! The worker owns no durable state — everything it needs arrives inside the
//! request, and everything it produces leaves inside the result. It exits
//! when either channel endpoint is dropped, finishing at most the load
//! already in flight first.

use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use lazylist_core::{Element, synthesize};

use crate::hooks::{Invalidator, Loaded, Loader, Synthesizer};
use crate::update::{self, LoadRequest, StateUpdate, UpdateOrigin};

pub(crate) fn spawn<T: Element>(
    mut loader: Box<dyn Loader<T>>,
    synthesizer: Synthesizer<T>,
    invalidator: Invalidator,
    requests: Receiver<LoadRequest<T>>,
    results: Sender<StateUpdate<T>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!("load worker started");
        while let Ok(request) = requests.recv() {
            let LoadRequest {
                direction,
                relative_to,
                base,
                generation,
            } = request;

            let Loaded { elements, has_more } = loader.load(direction, &relative_to);
            let loaded = elements.len();
            tracing::trace!(%direction, loaded, has_more, "load completed");

            let (raw, source_map) = update::merge_loaded(base, elements, direction);
            let synthesis = synthesize(&raw, |prev, cur, next| synthesizer(prev, cur, next));
            let result = StateUpdate {
                synthesis,
                raw,
                source_map,
                compact: Vec::new(),
                origin: UpdateOrigin::Load {
                    direction,
                    has_more,
                    loaded,
                },
                generation,
            };
            if results.send(result).is_err() {
                break;
            }
            invalidator();
        }
        tracing::debug!("load worker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;
    use lazylist_core::{Direction, Element, Serial};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    struct Item(u32);

    impl Element for Item {
        fn serial(&self) -> Serial {
            Serial::from(format!("item-{}", self.0))
        }
    }

    fn harness(
        loader: impl Loader<Item> + 'static,
        invalidations: Arc<AtomicUsize>,
    ) -> (
        Sender<LoadRequest<Item>>,
        Receiver<StateUpdate<Item>>,
        JoinHandle<()>,
    ) {
        let hooks: Hooks<Item, (), ()> = Hooks::new(loader, |_, _| ())
            .with_invalidator(move || {
                invalidations.fetch_add(1, Ordering::SeqCst);
            });
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let handle = spawn(
            hooks.loader,
            hooks.synthesizer,
            hooks.invalidator,
            req_rx,
            res_tx,
        );
        (req_tx, res_rx, handle)
    }

    #[test]
    fn worker_merges_and_reports() {
        let invalidations = Arc::new(AtomicUsize::new(0));
        let (req_tx, res_rx, _handle) = harness(
            |direction: Direction, relative_to: &Serial| {
                assert_eq!(direction, Direction::After);
                assert_eq!(relative_to.as_str(), "item-2");
                Loaded::more(vec![Item(3), Item(4)])
            },
            invalidations.clone(),
        );

        req_tx
            .send(LoadRequest {
                direction: Direction::After,
                relative_to: Serial::from("item-2"),
                base: vec![Item(1), Item(2)],
                generation: 0,
            })
            .unwrap();

        let result = res_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.raw, vec![Item(1), Item(2), Item(3), Item(4)]);
        assert_eq!(result.synthesis.len(), 4);
        assert!(matches!(
            result.origin,
            UpdateOrigin::Load {
                direction: Direction::After,
                has_more: true,
                loaded: 2,
            }
        ));
        assert_eq!(invalidations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn worker_exits_when_requests_close() {
        let invalidations = Arc::new(AtomicUsize::new(0));
        let (req_tx, _res_rx, handle) = harness(
            |_: Direction, _: &Serial| Loaded::end(Vec::new()),
            invalidations,
        );
        drop(req_tx);
        handle.join().unwrap();
    }

    #[test]
    fn worker_exits_when_results_close() {
        let invalidations = Arc::new(AtomicUsize::new(0));
        let (req_tx, res_rx, handle) = harness(
            |_: Direction, _: &Serial| Loaded::end(Vec::new()),
            invalidations,
        );
        drop(res_rx);
        req_tx
            .send(LoadRequest {
                direction: Direction::Before,
                relative_to: Serial::none(),
                base: Vec::new(),
                generation: 0,
            })
            .unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn worker_applies_synthesizer() {
        let hooks: Hooks<Item, (), ()> =
            Hooks::new(|_: Direction, _: &Serial| Loaded::end(vec![Item(1), Item(2)]), |_, _| ())
                .with_synthesizer(|prev, cur: &Item, _| {
                    if prev.is_none() {
                        vec![cur.clone()]
                    } else {
                        vec![Item(cur.0 + 100), cur.clone()]
                    }
                });
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let _handle = spawn(
            hooks.loader,
            hooks.synthesizer,
            hooks.invalidator,
            req_rx,
            res_tx,
        );

        req_tx
            .send(LoadRequest {
                direction: Direction::After,
                relative_to: Serial::none(),
                base: Vec::new(),
                generation: 3,
            })
            .unwrap();
        let result = res_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(result.generation, 3);
        assert_eq!(
            result.synthesis.elements(),
            &[Item(1), Item(102), Item(2)]
        );
    }
}
