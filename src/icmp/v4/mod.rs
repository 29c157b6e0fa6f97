pub(crate) mod packet;
pub mod socket;

pub use socket::ProbeSocket;
pub use socket::RawSocket;
