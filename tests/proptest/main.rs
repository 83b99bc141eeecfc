// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Property-based tests for etcd-operator.
//!
//! Uses proptest to generate random inputs and verify invariants of the
//! bootstrap topology builder.

use proptest::prelude::*;

use etcd_operator::resources::topology::{initial_cluster, initial_cluster_token};

/// Strategy for DNS-label style object names.
fn valid_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,14}"
}

/// Strategy for member counts, covering empty and negative inputs.
fn any_replicas() -> impl Strategy<Value = i32> {
    -3..=15i32
}

proptest! {
    /// Property: one peer entry per ordinal, in ascending ordinal order,
    /// each shaped as `<name>-<i>=https://<name>-<i>.<name>.<namespace>.svc:2380`.
    #[test]
    fn test_initial_cluster_entry_per_ordinal(
        name in valid_name(),
        namespace in valid_name(),
        replicas in any_replicas(),
    ) {
        let topology = initial_cluster(&name, &namespace, replicas);

        if replicas <= 0 {
            prop_assert_eq!(topology, "");
        } else {
            let entries: Vec<&str> = topology.split(',').collect();
            prop_assert_eq!(entries.len(), replicas as usize);
            for (i, entry) in entries.iter().enumerate() {
                let expected = format!(
                    "{name}-{i}=https://{name}-{i}.{name}.{namespace}.svc:2380"
                );
                prop_assert_eq!(*entry, expected.as_str());
            }
        }
    }

    /// Property: the builder is a pure function of its inputs. The string is
    /// baked into the pod template once, so recomputation must agree.
    #[test]
    fn test_initial_cluster_deterministic(
        name in valid_name(),
        namespace in valid_name(),
        replicas in any_replicas(),
    ) {
        prop_assert_eq!(
            initial_cluster(&name, &namespace, replicas),
            initial_cluster(&name, &namespace, replicas)
        );
    }

    /// Property: the token binds cluster name and namespace.
    #[test]
    fn test_initial_cluster_token_shape(
        name in valid_name(),
        namespace in valid_name(),
    ) {
        prop_assert_eq!(
            initial_cluster_token(&name, &namespace),
            format!("{name}-{namespace}")
        );
    }
}
