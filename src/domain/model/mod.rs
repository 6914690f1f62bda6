//! Model domain - inference model descriptors

mod descriptor;
mod network_type;

pub use descriptor::{
    split_storage_key, storage_key, validate_model_name, ContourNames, DescriptorError,
    ModelDescriptor,
};
pub use network_type::NetworkType;
