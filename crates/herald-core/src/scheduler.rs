//! Announcement Scheduler
//!
//! Serializes writes to each live region. Every channel (polite, assertive)
//! runs its own state machine:
//!
//! - **Idle**: a request writes immediately if the minimum spacing since the
//!   last write has passed, otherwise it becomes the pending write.
//! - **Pending**: later requests replace the pending text; the replaced
//!   request resolves as [`Delivery::Superseded`]. Only the newest text fires,
//!   and the request holding the slot waits out the spacing itself.
//! - **Writing**: clear the region, yield one tick, write the text, record
//!   it. A request arriving now becomes pending and fires after the spacing.
//!
//! Only one writer can be between clear and write on a channel at a time.
//! Dropping a request never wedges a channel: an interrupted write is
//! finished on drop, and a dropped pending request frees the slot.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use herald_a11y::{Politeness, RegionManager};
use herald_dom::{NodeId, SharedDocument};
use smol::channel::{Receiver, Sender};

/// How a request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the region; carries the exact text, perturbation included
    Written(String),
    /// Overtaken by a newer request while pending
    Superseded,
}

/// Observable channel state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Pending,
    Writing,
}

#[derive(Debug)]
struct PendingWrite {
    serial: u64,
    text: String,
    force: bool,
    reply: Sender<Delivery>,
}

#[derive(Debug, Default)]
struct Channel {
    last_text: Option<String>,
    last_at: Option<Instant>,
    writing: bool,
    pending: Option<PendingWrite>,
    /// Bumped by `reset`; writes started before it do not record state
    epoch: u64,
}

impl Channel {
    fn remaining_spacing(&self, spacing: Duration, now: Instant) -> Duration {
        self.last_at
            .map(|at| spacing.saturating_sub(now.saturating_duration_since(at)))
            .unwrap_or_default()
    }

    fn state(&self) -> ChannelState {
        if self.writing {
            ChannelState::Writing
        } else if self.pending.is_some() {
            ChannelState::Pending
        } else {
            ChannelState::Idle
        }
    }
}

/// A write between clear and set. Dropping it finishes the write.
struct WriteGuard<'a> {
    scheduler: &'a Scheduler,
    politeness: Politeness,
    text: String,
    dom_text: String,
    epoch: u64,
    finished: bool,
}

impl WriteGuard<'_> {
    fn finish(mut self) -> String {
        self.complete();
        std::mem::take(&mut self.dom_text)
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.scheduler.write_region(self.politeness, &self.dom_text);

        let mut channels = self.scheduler.channels.borrow_mut();
        let channel = &mut channels[self.politeness.index()];
        if channel.epoch == self.epoch {
            channel.last_text = Some(std::mem::take(&mut self.text));
            channel.last_at = Some(Instant::now());
            channel.writing = false;
        }
        tracing::trace!(
            politeness = %self.politeness,
            text = %self.dom_text.escape_debug(),
            "live region written"
        );
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(politeness = %self.politeness, "write interrupted, finishing it");
            self.complete();
        }
    }
}

/// Claim on the pending slot. Dropping it frees the slot if still held.
struct PendingTicket<'a> {
    scheduler: &'a Scheduler,
    politeness: Politeness,
    serial: u64,
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        let mut channels = self.scheduler.channels.borrow_mut();
        let channel = &mut channels[self.politeness.index()];
        if channel.pending.take_if(|p| p.serial == self.serial).is_some() {
            tracing::debug!(politeness = %self.politeness, "pending announcement abandoned");
        }
    }
}

enum Admission<'a> {
    Direct(WriteGuard<'a>),
    Queued(PendingTicket<'a>, Receiver<Delivery>),
}

enum Step {
    Wait(Duration),
    Fire(PendingWrite),
}

/// Per-channel announcement scheduler; the only writer of live-region text
#[derive(Debug)]
pub struct Scheduler {
    document: Option<SharedDocument>,
    regions: RefCell<RegionManager>,
    channels: RefCell<[Channel; 2]>,
    spacing: Cell<Duration>,
    invisible_chars: RefCell<Vec<char>>,
    rotation: Cell<usize>,
    next_serial: Cell<u64>,
}

impl Scheduler {
    pub fn new(
        document: Option<SharedDocument>,
        regions: RegionManager,
        spacing: Duration,
        invisible_chars: Vec<char>,
    ) -> Self {
        Self {
            document,
            regions: RefCell::new(regions),
            channels: RefCell::new(Default::default()),
            spacing: Cell::new(spacing),
            invisible_chars: RefCell::new(invisible_chars),
            rotation: Cell::new(0),
            next_serial: Cell::new(0),
        }
    }

    /// Deliver `text` to the region of `politeness`.
    ///
    /// Resolves once the text is written or once a newer request replaced it.
    pub async fn announce(&self, politeness: Politeness, text: &str, force: bool) -> Delivery {
        match self.admit(politeness, text, force) {
            Admission::Direct(write) => {
                smol::future::yield_now().await;
                Delivery::Written(write.finish())
            }
            Admission::Queued(ticket, receiver) => self.wait_pending(ticket, receiver).await,
        }
    }

    fn admit(&self, politeness: Politeness, text: &str, force: bool) -> Admission<'_> {
        let slot = politeness.index();
        let mut channels = self.channels.borrow_mut();
        let channel = &mut channels[slot];
        let busy = channel.pending.is_some()
            || channel.writing
            || !channel.remaining_spacing(self.spacing.get(), Instant::now()).is_zero();

        if !busy {
            drop(channels);
            return Admission::Direct(self.begin_write(politeness, text, force));
        }

        let serial = self.next_serial.get();
        self.next_serial.set(serial + 1);
        let (reply, receiver) = smol::channel::bounded(1);
        let write = PendingWrite { serial, text: text.to_string(), force, reply };
        if let Some(replaced) = channel.pending.replace(write) {
            let _ = replaced.reply.try_send(Delivery::Superseded);
            tracing::debug!(%politeness, "pending announcement superseded");
        }
        Admission::Queued(
            PendingTicket { scheduler: self, politeness, serial },
            receiver,
        )
    }

    /// Hold the pending slot until the spacing has passed, then write.
    ///
    /// Returns early when a newer request takes the slot or a reset drops it.
    async fn wait_pending(&self, ticket: PendingTicket<'_>, receiver: Receiver<Delivery>) -> Delivery {
        let politeness = ticket.politeness;
        loop {
            let step = {
                let mut channels = self.channels.borrow_mut();
                let channel = &mut channels[politeness.index()];
                let spacing = self.spacing.get();
                if channel.writing {
                    Step::Wait(spacing)
                } else {
                    let remaining = channel.remaining_spacing(spacing, Instant::now());
                    if !remaining.is_zero() {
                        Step::Wait(remaining)
                    } else {
                        match channel.pending.take_if(|p| p.serial == ticket.serial) {
                            Some(pending) => Step::Fire(pending),
                            None => return Delivery::Superseded,
                        }
                    }
                }
            };

            match step {
                Step::Wait(delay) => {
                    let woken = smol::future::or(
                        async { Some(receiver.recv().await.unwrap_or(Delivery::Superseded)) },
                        async {
                            smol::Timer::after(delay).await;
                            None
                        },
                    )
                    .await;
                    if let Some(delivery) = woken {
                        return delivery;
                    }
                }
                Step::Fire(pending) => {
                    let write = self.begin_write(politeness, &pending.text, pending.force);
                    smol::future::yield_now().await;
                    return Delivery::Written(write.finish());
                }
            }
        }
    }

    /// Pick the region text, mark the channel writing and clear the region
    fn begin_write(&self, politeness: Politeness, text: &str, force: bool) -> WriteGuard<'_> {
        let (dom_text, epoch) = {
            let mut channels = self.channels.borrow_mut();
            let channel = &mut channels[politeness.index()];
            let last = channel.last_text.as_deref();
            let repeat = last == Some(text) || (force && last.is_some());
            let dom_text = if repeat {
                format!("{text}{}", self.next_invisible())
            } else {
                text.to_string()
            };
            channel.writing = true;
            (dom_text, channel.epoch)
        };

        self.write_region(politeness, "");
        WriteGuard {
            scheduler: self,
            politeness,
            text: text.to_string(),
            dom_text,
            epoch,
            finished: false,
        }
    }

    fn next_invisible(&self) -> char {
        let pool = self.invisible_chars.borrow();
        let index = self.rotation.get();
        self.rotation.set(index.wrapping_add(1));
        pool.get(index % pool.len().max(1)).copied().unwrap_or('\u{200B}')
    }

    fn write_region(&self, politeness: Politeness, text: &str) {
        let Some(document) = &self.document else {
            return;
        };
        let mut doc = document.borrow_mut();
        let mut regions = self.regions.borrow_mut();
        if let Err(err) = regions.ensure(&mut doc) {
            tracing::debug!(%err, "live regions unavailable, skipping write");
            return;
        }
        if let Some(region) = regions.region(politeness) {
            if let Err(err) = doc.set_text_content(region, text) {
                tracing::debug!(%err, %politeness, "live region write failed");
            }
        }
    }

    /// Create the live regions now instead of on first write
    pub fn ensure_regions(&self) {
        let Some(document) = &self.document else {
            return;
        };
        if let Err(err) = self.regions.borrow_mut().ensure(&mut document.borrow_mut()) {
            tracing::debug!(%err, "live regions unavailable");
        }
    }

    /// Region element of a channel, once created
    pub fn region(&self, politeness: Politeness) -> Option<NodeId> {
        self.regions.borrow().region(politeness)
    }

    /// Current text of a channel's region
    pub fn region_text(&self, politeness: Politeness) -> Option<String> {
        let document = self.document.as_ref()?;
        let region = self.region(politeness)?;
        Some(document.borrow().text_content(region))
    }

    /// Last text announced on a channel, without perturbation
    pub fn last_announced(&self, politeness: Politeness) -> Option<String> {
        self.channels.borrow()[politeness.index()].last_text.clone()
    }

    pub fn state(&self, politeness: Politeness) -> ChannelState {
        self.channels.borrow()[politeness.index()].state()
    }

    pub fn document(&self) -> Option<&SharedDocument> {
        self.document.as_ref()
    }

    /// Apply new timing, pool and prefix settings
    pub fn reconfigure(&self, spacing: Duration, invisible_chars: Vec<char>, region_prefix: &str) {
        self.spacing.set(spacing);
        *self.invisible_chars.borrow_mut() = invisible_chars;
        self.regions.borrow_mut().set_prefix(region_prefix);
    }

    /// Return every channel to idle with no history.
    ///
    /// Dropped pending requests resolve as superseded. A write already
    /// between clear and set still lands in the region but no longer
    /// counts as the channel's last announcement.
    pub fn reset(&self) {
        for channel in self.channels.borrow_mut().iter_mut() {
            channel.last_text = None;
            channel.last_at = None;
            channel.pending = None;
            channel.writing = false;
            channel.epoch = channel.epoch.wrapping_add(1);
        }
        self.rotation.set(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_dom::{Document, MutationKind};
    use smol::future::{or, poll_once, zip};
    use std::pin::pin;

    const SPACING: Duration = Duration::from_millis(30);

    fn scheduler() -> (Scheduler, SharedDocument) {
        let doc = herald_dom::shared(Document::new());
        let scheduler = Scheduler::new(
            Some(doc.clone()),
            RegionManager::default(),
            SPACING,
            crate::config::DEFAULT_INVISIBLE_CHARS.to_vec(),
        );
        scheduler.ensure_regions();
        (scheduler, doc)
    }

    fn region_writes(doc: &SharedDocument, region: NodeId) -> Vec<String> {
        doc.borrow_mut()
            .take_mutations()
            .into_iter()
            .filter(|m| m.kind == MutationKind::TextContentModified && m.target == region)
            .filter_map(|m| m.new_value)
            .collect()
    }

    #[test]
    fn test_idle_channel_writes_immediately() {
        let (scheduler, doc) = scheduler();
        doc.borrow_mut().enable_mutation_log();

        let delivery = smol::block_on(scheduler.announce(Politeness::Polite, "Saved", false));
        assert_eq!(delivery, Delivery::Written("Saved".into()));

        let region = scheduler.region(Politeness::Polite).unwrap();
        assert_eq!(region_writes(&doc, region), vec!["".to_string(), "Saved".to_string()]);
        assert_eq!(scheduler.state(Politeness::Polite), ChannelState::Idle);
    }

    #[test]
    fn test_repeat_rotates_invisible_characters() {
        let (scheduler, _) = scheduler();
        let written: Vec<_> = smol::block_on(async {
            let mut out = Vec::new();
            for _ in 0..6 {
                out.push(scheduler.announce(Politeness::Assertive, "Retry", false).await);
            }
            out
        });

        assert_eq!(written[0], Delivery::Written("Retry".into()));
        assert_eq!(written[1], Delivery::Written("Retry\u{200B}".into()));
        assert_eq!(written[2], Delivery::Written("Retry\u{200C}".into()));
        assert_eq!(written[3], Delivery::Written("Retry\u{200D}".into()));
        assert_eq!(written[4], Delivery::Written("Retry\u{FEFF}".into()));
        assert_eq!(written[5], Delivery::Written("Retry\u{200B}".into()));
    }

    #[test]
    fn test_pending_write_replaced_by_latest() {
        let (scheduler, doc) = scheduler();
        let region = scheduler.region(Politeness::Polite).unwrap();

        let (first, second) = smol::block_on(async {
            scheduler.announce(Politeness::Polite, "Saving", false).await;
            doc.borrow_mut().enable_mutation_log();
            zip(
                scheduler.announce(Politeness::Polite, "Saved 1 file", false),
                scheduler.announce(Politeness::Polite, "Saved 2 files", false),
            )
            .await
        });

        assert_eq!(first, Delivery::Superseded);
        assert_eq!(second, Delivery::Written("Saved 2 files".into()));
        assert_eq!(
            region_writes(&doc, region),
            vec!["".to_string(), "Saved 2 files".to_string()]
        );
    }

    #[test]
    fn test_spacing_is_respected() {
        let (scheduler, _) = scheduler();
        let elapsed = smol::block_on(async {
            scheduler.announce(Politeness::Polite, "one", false).await;
            let start = Instant::now();
            scheduler.announce(Politeness::Polite, "two", false).await;
            start.elapsed()
        });
        assert!(elapsed >= SPACING - Duration::from_millis(5), "{elapsed:?}");
    }

    #[test]
    fn test_channels_are_independent() {
        let (scheduler, _) = scheduler();
        smol::block_on(async {
            scheduler.announce(Politeness::Polite, "Uploading", false).await;
            let start = Instant::now();
            let delivery = scheduler.announce(Politeness::Assertive, "Upload failed", false).await;
            assert_eq!(delivery, Delivery::Written("Upload failed".into()));
            assert!(start.elapsed() < SPACING);
        });
        assert_eq!(scheduler.region_text(Politeness::Polite).as_deref(), Some("Uploading"));
        assert_eq!(
            scheduler.region_text(Politeness::Assertive).as_deref(),
            Some("Upload failed")
        );
    }

    #[test]
    fn test_writes_never_interleave() {
        let (scheduler, doc) = scheduler();
        doc.borrow_mut().enable_mutation_log();
        let region = scheduler.region(Politeness::Polite).unwrap();

        smol::block_on(async {
            let burst = zip(
                zip(
                    scheduler.announce(Politeness::Polite, "a", false),
                    scheduler.announce(Politeness::Polite, "b", false),
                ),
                zip(
                    scheduler.announce(Politeness::Polite, "c", false),
                    scheduler.announce(Politeness::Polite, "d", false),
                ),
            );
            let ((a, b), (c, d)) = burst.await;
            assert_eq!(a, Delivery::Written("a".into()));
            assert_eq!(b, Delivery::Superseded);
            assert_eq!(c, Delivery::Superseded);
            assert_eq!(d, Delivery::Written("d".into()));
        });

        let writes = region_writes(&doc, region);
        assert_eq!(writes, vec!["", "a", "", "d"]);
    }

    #[test]
    fn test_headless_reports_text() {
        let scheduler = Scheduler::new(
            None,
            RegionManager::default(),
            SPACING,
            crate::config::DEFAULT_INVISIBLE_CHARS.to_vec(),
        );
        let written = smol::block_on(async {
            scheduler.announce(Politeness::Polite, "Hi", false).await;
            scheduler.announce(Politeness::Polite, "Hi", false).await
        });
        assert_eq!(written, Delivery::Written("Hi\u{200B}".into()));
        assert_eq!(scheduler.region_text(Politeness::Polite), None);
    }

    #[test]
    fn test_reset_forgets_last_text() {
        let (scheduler, _) = scheduler();
        smol::block_on(scheduler.announce(Politeness::Polite, "Hi", false));
        scheduler.reset();
        assert_eq!(scheduler.last_announced(Politeness::Polite), None);
        let written = smol::block_on(scheduler.announce(Politeness::Polite, "Hi", false));
        assert_eq!(written, Delivery::Written("Hi".into()));
    }

    /// `None` if the request has not resolved within a second
    async fn within_a_second(request: impl std::future::Future<Output = Delivery>) -> Option<Delivery> {
        or(async { Some(request.await) }, async {
            smol::Timer::after(Duration::from_secs(1)).await;
            None
        })
        .await
    }

    #[test]
    fn test_dropped_pending_request_frees_channel() {
        let (scheduler, _) = scheduler();
        smol::block_on(async {
            scheduler.announce(Politeness::Polite, "Uploading", false).await;
            let queued = poll_once(scheduler.announce(Politeness::Polite, "Uploaded", false)).await;
            assert_eq!(queued, None);
            assert_eq!(scheduler.state(Politeness::Polite), ChannelState::Idle);

            let next = within_a_second(scheduler.announce(Politeness::Polite, "Done", false)).await;
            assert_eq!(next, Some(Delivery::Written("Done".into())));
        });
    }

    #[test]
    fn test_dropped_writer_finishes_write() {
        let (scheduler, _) = scheduler();
        smol::block_on(async {
            let direct = poll_once(scheduler.announce(Politeness::Assertive, "Save failed", false)).await;
            assert_eq!(direct, None);
            assert_eq!(scheduler.state(Politeness::Assertive), ChannelState::Idle);
            assert_eq!(
                scheduler.region_text(Politeness::Assertive).as_deref(),
                Some("Save failed")
            );
            assert_eq!(
                scheduler.last_announced(Politeness::Assertive).as_deref(),
                Some("Save failed")
            );

            let next = within_a_second(scheduler.announce(Politeness::Assertive, "Retrying", false)).await;
            assert_eq!(next, Some(Delivery::Written("Retrying".into())));
        });
    }

    #[test]
    fn test_reset_during_write_returns_channel_to_idle() {
        let (scheduler, _) = scheduler();
        smol::block_on(async {
            let mut inflight = pin!(scheduler.announce(Politeness::Polite, "Old", false));
            assert_eq!(poll_once(inflight.as_mut()).await, None);
            assert_eq!(scheduler.state(Politeness::Polite), ChannelState::Writing);

            scheduler.reset();
            assert_eq!(scheduler.state(Politeness::Polite), ChannelState::Idle);

            assert_eq!(inflight.await, Delivery::Written("Old".into()));
            assert_eq!(scheduler.last_announced(Politeness::Polite), None);

            let next = within_a_second(scheduler.announce(Politeness::Polite, "New", false)).await;
            assert_eq!(next, Some(Delivery::Written("New".into())));
        });
    }

    #[test]
    fn test_reset_resolves_pending_as_superseded() {
        let (scheduler, _) = scheduler();
        smol::block_on(async {
            scheduler.announce(Politeness::Polite, "one", false).await;
            let mut queued = pin!(scheduler.announce(Politeness::Polite, "two", false));
            assert_eq!(poll_once(queued.as_mut()).await, None);
            assert_eq!(scheduler.state(Politeness::Polite), ChannelState::Pending);

            scheduler.reset();
            assert_eq!(within_a_second(queued).await, Some(Delivery::Superseded));
        });
    }
}
