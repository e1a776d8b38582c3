//! Broadcast of flow events for observers (UI, logging, tests)

use crate::types::Phase;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    pubsub::{PubSubChannel, Subscriber, WaitResult},
};

const EVENT_CAPACITY: usize = 32;
const MAX_SUBSCRIBERS: usize = 4;
const MAX_PUBLISHERS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum FlowEvent {
    PhaseChanged { from: Phase, to: Phase },
    TimerStarted,
    Tick { elapsed_seconds: u32 },
    TargetReached { elapsed_seconds: u32 },
    TimerStopped { elapsed_seconds: u32 },
    BrewSaved { brew_id: String },
    SubmitFailed { message: String },
    Reset,
}

type Channel = PubSubChannel<CriticalSectionRawMutex, FlowEvent, EVENT_CAPACITY, MAX_SUBSCRIBERS, MAX_PUBLISHERS>;

pub struct EventBus {
    channel: Channel,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            channel: PubSubChannel::new(),
        }
    }

    /// Publish without waiting; slow subscribers lose the oldest events
    pub fn emit(&self, event: FlowEvent) {
        log::debug!("Event: {:?}", event);
        self.channel.immediate_publisher().publish_immediate(event);
    }

    pub fn subscriber(&self) -> anyhow::Result<EventSubscriber<'_>> {
        let inner = self
            .channel
            .subscriber()
            .map_err(|e| anyhow::anyhow!("no subscriber slot left: {:?}", e))?;
        Ok(EventSubscriber { inner })
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber<'a> {
    inner: Subscriber<'a, CriticalSectionRawMutex, FlowEvent, EVENT_CAPACITY, MAX_SUBSCRIBERS, MAX_PUBLISHERS>,
}

impl<'a> EventSubscriber<'a> {
    pub async fn next_event(&mut self) -> FlowEvent {
        loop {
            match self.inner.next_message().await {
                WaitResult::Lagged(count) => {
                    log::warn!("Event subscriber lagged by {} events", count);
                }
                WaitResult::Message(event) => return event,
            }
        }
    }

    pub fn try_next_event(&mut self) -> Option<FlowEvent> {
        loop {
            match self.inner.try_next_message()? {
                WaitResult::Lagged(_) => continue,
                WaitResult::Message(event) => return Some(event),
            }
        }
    }

    /// Everything published since the last read
    pub fn drain(&mut self) -> Vec<FlowEvent> {
        std::iter::from_fn(|| self.try_next_event()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_in_order() {
        let bus = EventBus::new();
        let mut sub = bus.subscriber().unwrap();
        bus.emit(FlowEvent::TimerStarted);
        bus.emit(FlowEvent::Tick { elapsed_seconds: 1 });
        assert_eq!(
            sub.drain(),
            vec![FlowEvent::TimerStarted, FlowEvent::Tick { elapsed_seconds: 1 }]
        );
        assert!(sub.try_next_event().is_none());
    }

    #[test]
    fn test_subscriber_slots_are_limited() {
        let bus = EventBus::new();
        let subs: Vec<_> = (0..MAX_SUBSCRIBERS).map(|_| bus.subscriber().unwrap()).collect();
        assert!(bus.subscriber().is_err());
        drop(subs);
        assert!(bus.subscriber().is_ok());
    }

    #[test]
    fn test_lagging_subscriber_skips_ahead() {
        let bus = EventBus::new();
        let mut sub = bus.subscriber().unwrap();
        for n in 0..(EVENT_CAPACITY as u32 + 3) {
            bus.emit(FlowEvent::Tick { elapsed_seconds: n });
        }
        let events = sub.drain();
        assert_eq!(events.len(), EVENT_CAPACITY);
        assert_eq!(events[0], FlowEvent::Tick { elapsed_seconds: 3 });
    }

    #[test]
    fn test_next_event_skips_lag_and_waits() {
        let bus = EventBus::new();
        let mut sub = bus.subscriber().unwrap();
        for n in 0..(EVENT_CAPACITY as u32 + 1) {
            bus.emit(FlowEvent::Tick { elapsed_seconds: n });
        }
        let first = embassy_futures::block_on(sub.next_event());
        assert_eq!(first, FlowEvent::Tick { elapsed_seconds: 1 });

        sub.drain();
        let (event, _) = embassy_futures::block_on(embassy_futures::join::join(
            sub.next_event(),
            async { bus.emit(FlowEvent::Reset) },
        ));
        assert_eq!(event, FlowEvent::Reset);
    }
}
