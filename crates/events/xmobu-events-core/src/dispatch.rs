//! Dispatch boundary: callback failures stop here.

use crate::DispatchError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run one callback invocation, converting an error or a panic into a [`DispatchError`].
///
/// Never unwinds into the caller, so a misbehaving callback cannot take the
/// host's native dispatch loop down with it.
pub fn guarded_call<F>(callback: &str, event: &str, f: F) -> Result<(), DispatchError>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(DispatchError::Failed {
            callback: callback.to_string(),
            event: event.to_string(),
            reason: format!("{err:#}"),
        }),
        Err(payload) => Err(DispatchError::Panicked {
            callback: callback.to_string(),
            event: event.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_passes_through() {
        assert_eq!(guarded_call("cb", "open", || Ok(())), Ok(()));
    }

    #[test]
    fn error_becomes_failed() {
        let err = guarded_call("cb", "open", || anyhow::bail!("boom")).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Failed {
                callback: "cb".into(),
                event: "open".into(),
                reason: "boom".into(),
            }
        );
    }

    #[test]
    fn panic_is_contained() {
        let err = guarded_call("cb", "save", || panic!("listener exploded")).unwrap_err();
        assert_eq!(err.callback(), "cb");
        assert_eq!(err.event(), "save");
        match err {
            DispatchError::Panicked { message, .. } => assert_eq!(message, "listener exploded"),
            other => panic!("expected panic variant, got {other:?}"),
        }
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let n = 3;
        let err = guarded_call("cb", "new", || panic!("bad index {n}")).unwrap_err();
        assert!(err.to_string().contains("bad index 3"));
    }
}
