use std::rc::Rc;

use crate::{
    error::SignalError,
    host::ScriptHost,
    listener::ListenerId,
    signal::Signal,
};

/// The script-facing handle of a listener: `Disconnect()` and the `Connected` property.
///
/// Dropping a `Connection` does not disconnect; the listener stays registered until it is
/// disconnected explicitly, fires as a once-listener, or the signal closes.
pub struct Connection<H: ScriptHost> {
    signal: Rc<Signal<H>>,
    id: ListenerId,
}

impl<H: ScriptHost> Connection<H> {
    /// Connects `callable` and wraps the resulting id.
    pub fn bind(signal: &Rc<Signal<H>>, callable: &H::Value, once: bool) -> Result<Self, SignalError> {
        let id = signal.connect(callable, once, false)?;
        Ok(Self { signal: signal.clone(), id })
    }

    pub fn id(&self) -> ListenerId { self.id }

    pub fn is_connected(&self) -> bool { self.signal.is_connected(self.id) }

    pub fn disconnect(&self) { self.signal.disconnect(self.id) }

    pub fn signal(&self) -> &Rc<Signal<H>> { &self.signal }
}

impl<H: ScriptHost> Clone for Connection<H> {
    fn clone(&self) -> Self { Self { signal: self.signal.clone(), id: self.id } }
}

impl<H: ScriptHost> std::fmt::Debug for Connection<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "Connection({})", self.id) }
}
