use crate::Entity;
use cgmath::Vector3;
use crossbeam::channel::{Receiver, Sender, TrySendError, unbounded};
use log::trace;

/// Events a creature reports to whoever resolves the consequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// A strike connected during its hit window. Damage is not applied yet.
    HitLanded {
        attacker: Entity,
        target: Entity,
        damage: f32,
    },
    /// The creature died.
    Died { entity: Entity },
    /// Stuck recovery moved the creature.
    Teleported {
        entity: Entity,
        from: Vector3<f32>,
        to: Vector3<f32>,
    },
}

/// Consuming end of the behavior event channel.
///
/// Clones share one queue, every event is delivered to exactly one of them.
#[derive(Clone, Debug)]
pub struct IntentReceiver {
    inner: Receiver<Intent>,
}

impl IntentReceiver {
    pub fn new(inner: Receiver<Intent>) -> Self {
        Self { inner }
    }

    /// Next pending event, without waiting.
    pub fn try_recv(&self) -> Option<Intent> {
        self.inner.try_recv().ok()
    }

    /// Every event queued so far, oldest first.
    pub fn try_recv_all(&self) -> Vec<Intent> {
        self.inner.try_iter().collect()
    }

    /// Lazily drains the queued events.
    pub fn iter(&self) -> impl Iterator<Item = Intent> + '_ {
        self.inner.try_iter()
    }

    pub fn pending(&self) -> usize {
        self.inner.len()
    }
}

/// Producing end of the behavior event channel. Cheap to clone into every controller.
#[derive(Clone, Debug)]
pub struct IntentSender {
    inner: Sender<Intent>,
}

impl IntentSender {
    pub fn new(inner: Sender<Intent>) -> Self {
        Self { inner }
    }

    /// Queues an event.
    ///
    /// # Returns
    ///
    /// `false` once every receiver is gone. The event is dropped in that case.
    pub fn send(&self, intent: Intent) -> bool {
        match self.inner.try_send(intent) {
            Ok(()) => true,
            Err(TrySendError::Disconnected(intent) | TrySendError::Full(intent)) => {
                trace!("Dropping {intent:?}, nobody is listening");
                false
            }
        }
    }

    /// Reports a strike that connected.
    ///
    /// # Arguments
    ///
    /// * `attacker` - The striking entity.
    /// * `target` - The entity that was hit.
    /// * `damage` - Damage the strike carries.
    pub fn send_hit(&self, attacker: Entity, target: Entity, damage: f32) -> bool {
        self.send(Intent::HitLanded {
            attacker,
            target,
            damage,
        })
    }

    pub fn send_died(&self, entity: Entity) -> bool {
        self.send(Intent::Died { entity })
    }

    pub fn send_teleported(&self, entity: Entity, from: Vector3<f32>, to: Vector3<f32>) -> bool {
        self.send(Intent::Teleported { entity, from, to })
    }
}

/// Opens an unbounded event channel.
pub fn create_intent_channel() -> (IntentSender, IntentReceiver) {
    let (tx, rx) = unbounded();
    (IntentSender::new(tx), IntentReceiver::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_single_event() {
        let (tx, rx) = create_intent_channel();
        assert!(tx.send_died(Entity(1)));
        assert_eq!(rx.pending(), 1);
        assert_eq!(rx.try_recv(), Some(Intent::Died { entity: Entity(1) }));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_events_keep_their_order() {
        let (tx, rx) = create_intent_channel();
        tx.send_hit(Entity(1), Entity(2), 5.0);
        tx.send_died(Entity(2));
        tx.send_teleported(Entity(3), Vector3::new(0.0, 0.0, 0.0), Vector3::new(2.0, 0.0, 0.0));

        let drained = rx.try_recv_all();
        assert_eq!(drained.len(), 3);
        assert_eq!(
            drained[0],
            Intent::HitLanded {
                attacker: Entity(1),
                target: Entity(2),
                damage: 5.0
            }
        );
        assert_eq!(drained[1], Intent::Died { entity: Entity(2) });
        assert!(rx.try_recv_all().is_empty());
    }

    #[test]
    fn test_clones_share_the_queue() {
        let (tx, rx) = create_intent_channel();
        let other = rx.clone();
        for i in 0..3 {
            tx.clone().send_died(Entity(i));
        }

        assert_eq!(other.iter().take(2).count(), 2);
        assert_eq!(rx.iter().count(), 1);
    }

    #[test]
    fn test_send_without_receivers() {
        let (tx, rx) = create_intent_channel();
        drop(rx);
        assert!(!tx.send_died(Entity(4)));
    }
}
