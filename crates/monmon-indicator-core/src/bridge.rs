//! Cloud-bridge entry points
//!
//! The host platform's function bridge invokes a registered handler with
//! a raw argument string and expects an integer status. These two entry
//! points parse exactly like the corresponding line-protocol verbs (minus
//! the verb token) and report success as a binary code instead of text.

use crate::app::App;
use crate::driver::LedDriver;
use crate::storage::Storage;

/// Bridge success status
pub const BRIDGE_OK: i32 = 0;
/// Bridge failure status
pub const BRIDGE_ERR: i32 = -1;

/// Register a device: `args` is `"<id> <slot>"`.
pub fn bridge_add<S: Storage, D: LedDriver<N>, const N: usize>(
    app: &mut App<S, D, N>,
    args: &str,
) -> i32 {
    match app.cmd_add(&mut args.split(' ')) {
        Ok(()) => BRIDGE_OK,
        Err(_) => BRIDGE_ERR,
    }
}

/// Unregister a device: `args` is `"<id>"`.
pub fn bridge_remove<S: Storage, D: LedDriver<N>, const N: usize>(
    app: &mut App<S, D, N>,
    args: &str,
) -> i32 {
    match app.cmd_remove(&mut args.split(' ')) {
        Ok(()) => BRIDGE_OK,
        Err(_) => BRIDGE_ERR,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::color::Rgb;
    use crate::engine::EngineConfig;
    use crate::image::IMAGE_LEN;
    use crate::storage::StorageError;

    #[derive(Clone)]
    struct MemStorage {
        bytes: Rc<RefCell<[u8; IMAGE_LEN]>>,
    }

    impl Storage for MemStorage {
        fn read(&mut self, buffer: &mut [u8]) -> Result<(), StorageError> {
            buffer.copy_from_slice(&self.bytes.borrow()[..buffer.len()]);
            Ok(())
        }

        fn write(&mut self, buffer: &[u8]) -> Result<(), StorageError> {
            self.bytes.borrow_mut()[..buffer.len()].copy_from_slice(buffer);
            Ok(())
        }
    }

    struct NullDriver;

    impl<const N: usize> LedDriver<N> for NullDriver {
        fn write(&mut self, _frame: &[Rgb; N], _brightness: u8) {}
    }

    fn app() -> App<MemStorage, NullDriver, 6> {
        let storage = MemStorage {
            bytes: Rc::new(RefCell::new([0xFF; IMAGE_LEN])),
        };
        App::new(storage, NullDriver, EngineConfig::default())
    }

    #[test]
    fn add_parses_like_the_line_verb() {
        let mut app = app();
        assert_eq!(bridge_add(&mut app, "1001 2"), BRIDGE_OK);
        assert_eq!(app.registry.lookup(1001), Some(2));
    }

    #[test]
    fn add_rejects_malformed_arguments() {
        let mut app = app();
        assert_eq!(bridge_add(&mut app, "1001"), BRIDGE_ERR);
        assert_eq!(bridge_add(&mut app, "abc 1"), BRIDGE_ERR);
        assert_eq!(bridge_add(&mut app, ""), BRIDGE_ERR);
        assert!(app.registry.is_empty());
    }

    #[test]
    fn remove_is_idempotent_like_the_line_verb() {
        let mut app = app();
        bridge_add(&mut app, "1001 2");

        assert_eq!(bridge_remove(&mut app, "1001"), BRIDGE_OK);
        assert_eq!(bridge_remove(&mut app, "1001"), BRIDGE_OK);
        assert_eq!(bridge_remove(&mut app, "abc"), BRIDGE_ERR);
    }
}
