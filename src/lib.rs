pub mod env;
pub mod message;
pub mod peer;

pub use message::{classify, ClassifyError, Message, ResponseResult};
pub use peer::{HandlerError, IdSource, NoopHandler, Peer, PeerError, PeerHandler, Transport};
