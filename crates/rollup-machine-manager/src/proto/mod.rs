//! Generated protobuf types for the manager and machine server surfaces.
//!
//! The `.proto` sources live in the repository's top-level `proto/`
//! directory; the generated code is committed so builds do not depend on
//! `protoc`.

pub mod cartesi {
    pub mod machine {
        pub mod v1 {
            include!("cartesi.machine.v1.rs");
        }
    }

    pub mod rollup {
        pub mod v1 {
            include!("cartesi.rollup.v1.rs");
        }
    }
}
