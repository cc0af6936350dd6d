//! USB HID side of the KNX interface.
//!
//! - [`transport`]: the [`HidTransport`] trait a device backend implements
//! - [`link`]: [`KnxHidLink`], sending and receiving whole telegrams
//! - [`mock_transport`]: an in-memory transport for tests (`std` only)

pub mod link;
#[cfg(any(test, feature = "std"))]
pub mod mock_transport;
pub mod transport;

pub use link::KnxHidLink;
#[cfg(any(test, feature = "std"))]
pub use mock_transport::MockHidTransport;
pub use transport::HidTransport;
