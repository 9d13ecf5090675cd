//! Shared test setup: one global tracing subscriber for all tests of a binary.

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{EditorVariant, NodeType, Outline, TreeNode};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // RUST_LOG wins; quiet by default so `cargo test` output stays readable
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coursetree=warn"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
    if env::var("RUST_LOG").is_ok() {
        debug!("test logging from RUST_LOG");
    }
}

/// Node with a fixed id; the title is the id upper-cased.
pub fn node(id: &str, kind: NodeType) -> TreeNode {
    TreeNode::new(id.to_uppercase(), kind).with_id(id)
}

/// Curriculum outline used across tests:
///
/// ```text
/// s1 (section)
/// ├── u1 (unit)
/// │   ├── t1 (topic)
/// │   │   └── l1 (lesson)
/// │   └── t2 (topic)
/// └── u2 (unit)
/// s2 (section)
/// ```
pub fn sample_curriculum() -> Outline {
    let nodes = vec![
        node("s1", NodeType::Section).with_children(vec![
            node("u1", NodeType::Unit).with_children(vec![
                node("t1", NodeType::Topic).with_children(vec![node("l1", NodeType::Lesson)]),
                node("t2", NodeType::Topic),
            ]),
            node("u2", NodeType::Unit),
        ]),
        node("s2", NodeType::Section),
    ];
    Outline::from_nodes(EditorVariant::Curriculum, nodes).unwrap_or_else(|_| Outline::new(EditorVariant::Curriculum))
}
