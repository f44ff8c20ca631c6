pub mod dataset_transport;

pub use dataset_transport::DatasetTransport;
