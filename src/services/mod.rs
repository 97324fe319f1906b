pub mod poller;
pub mod subscriber;
pub mod transport;
