//! Generated protobuf and gRPC bindings.
//!
//! Module nesting mirrors the protobuf packages so the cross-package paths
//! emitted by `prost` (`super::super::...`) resolve.

#![allow(clippy::all)]

pub mod envoy {
    pub mod config {
        pub mod core {
            pub mod v3 {
                tonic::include_proto!("envoy.config.core.v3");
            }
        }
    }

    pub mod extensions {
        pub mod filters {
            pub mod http {
                pub mod ext_proc {
                    pub mod v3alpha {
                        tonic::include_proto!("envoy.extensions.filters.http.ext_proc.v3alpha");
                    }
                }
            }
        }
    }

    pub mod service {
        pub mod ext_proc {
            pub mod v3alpha {
                tonic::include_proto!("envoy.service.ext_proc.v3alpha");
            }
        }
    }
}

pub mod grpc {
    pub mod health {
        pub mod v1 {
            tonic::include_proto!("grpc.health.v1");
        }
    }
}

pub use envoy::config::core::v3 as base;
pub use envoy::extensions::filters::http::ext_proc::v3alpha as filter;
pub use envoy::service::ext_proc::v3alpha as ext_proc;
pub use grpc::health::v1 as health;
