//! Property-based test generators using proptest.
//!
//! Every generated path is valid under the resource path grammar.

use blobstate_resources::{Owner, ResourcePath, ResourceType};
use proptest::prelude::*;

/// Strategy for path segments that can never be mistaken for a revision.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9._+~-]{0,11}").expect("Invalid regex")
}

/// Strategy for resource types.
pub fn resource_type_strategy() -> impl Strategy<Value = ResourceType> {
    prop_oneof![Just(ResourceType::Blob), Just(ResourceType::Zip)]
}

/// Strategy for owners.
pub fn owner_strategy() -> impl Strategy<Value = Owner> {
    prop_oneof![
        Just(Owner::Shared),
        segment_strategy().prop_map(Owner::User),
        segment_strategy().prop_map(Owner::Org),
    ]
}

/// Strategy for valid resource paths.
pub fn resource_path_strategy() -> impl Strategy<Value = ResourcePath> {
    (
        resource_type_strategy(),
        owner_strategy(),
        prop::option::of(segment_strategy()),
        segment_strategy(),
        segment_strategy(),
        prop::option::of(1u32..10_000),
    )
        .prop_map(|(kind, owner, stream, series, name, revision)| {
            ResourcePath::from_parts(kind, owner, stream, series, name, revision)
                .expect("generated parts form a valid path")
        })
}

/// Strategy for resource content (arbitrary bytes).
pub fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}
