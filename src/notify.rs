use crate::model::ResourceId;

/// Hook for the waiting-list collaborator. The ledger calls it once after
/// every successful cancellation; queue contents are not managed here.
pub trait AvailabilityObserver {
    fn on_resource_available(&mut self, resource_id: &ResourceId);
}

/// Default observer: nobody is listening.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl AvailabilityObserver for NoopObserver {
    fn on_resource_available(&mut self, _resource_id: &ResourceId) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recording(Rc<RefCell<Vec<ResourceId>>>);

    impl AvailabilityObserver for Recording {
        fn on_resource_available(&mut self, resource_id: &ResourceId) {
            self.0.borrow_mut().push(resource_id.clone());
        }
    }

    #[test]
    fn observer_receives_resource_id() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut obs = Recording(seen.clone());
        obs.on_resource_available(&"R1".to_string());
        assert_eq!(*seen.borrow(), vec!["R1".to_string()]);
    }

    #[test]
    fn noop_observer_is_silent() {
        let mut obs = NoopObserver;
        obs.on_resource_available(&"R1".to_string());
    }
}
