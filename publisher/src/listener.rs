use std::sync::Arc;
use uuid::Uuid;

use common::traits::Notifiable;
use common::types::Callback;

#[derive(Clone)]
pub struct Listener<T> {
    callback: Callback<T>,
    id: Option<Uuid>,
}

impl<T> Listener<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Uuid, Arc<T>) + Send + Sync + 'static,
    {
        Listener {
            callback: Arc::new(callback),
            id: None,
        }
    }

    /// Id assigned by the publisher this listener was last registered on.
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }
}

impl<T> Notifiable<T> for Listener<T> {
    fn get_callback(&self) -> Callback<T> {
        self.callback.clone()
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }

    fn get_id(&self) -> Option<Uuid> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_new_listener() {
        let listener = Listener::new(|_id: Uuid, value: Arc<i32>| {
            assert_eq!(*value, 42);
        });

        assert!(listener.id().is_none());
        let callback = listener.get_callback();
        callback(Uuid::new_v4(), Arc::new(42));
    }

    #[test]
    fn test_listener_with_shared_state() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let listener = Listener::new({
            let received = received.clone();
            move |_id: Uuid, value: Arc<Vec<i32>>| {
                received.lock().unwrap().extend(value.iter().copied());
            }
        });

        let callback = listener.get_callback();
        callback(Uuid::new_v4(), Arc::new(vec![400, 401]));
        assert_eq!(*received.lock().unwrap(), vec![400, 401]);
    }

    #[test]
    fn test_set_id() {
        let mut listener = Listener::new(|_id: Uuid, _value: Arc<i32>| {});
        let id = Uuid::new_v4();
        listener.set_id(id);
        assert_eq!(listener.get_id(), Some(id));
    }
}
