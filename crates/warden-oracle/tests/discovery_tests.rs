//! Discovery and reputation fallback behavior.

mod common;

use common::*;
use warden_oracle::{discovery, reputation};

#[tokio::test]
async fn indexer_path_skips_the_chain() {
    let chain = MockChain::with_monitored(&[(0, "http://a"), (1, "http://b")]);
    let indexer = MockIndexer::with_agents(vec![
        ("0", "http://a/health"),
        ("42", "http://answer/health"),
    ]);

    let agents = discovery::list_monitored(indexer.as_ref(), chain.as_ref()).await;
    assert_eq!(
        agents,
        vec![
            ("0".to_string(), "http://a/health".to_string()),
            ("42".to_string(), "http://answer/health".to_string()),
        ]
    );
    // no chain reads when the indexer answers
    assert_eq!(*chain.read_count.lock().unwrap(), 0);
}

#[tokio::test]
async fn indexer_outage_falls_back_to_bounded_scan() {
    // monitored flags scattered across the scan range, one outside it
    let chain = MockChain::with_monitored(&[
        (3, "http://three/health"),
        (7, "http://seven/health"),
        (19, "http://nineteen/health"),
        (21, "http://twentyone/health"),
    ]);
    chain.health.lock().unwrap().insert(
        5,
        warden_types::OnChainHealth {
            is_monitored: false,
            endpoint: "http://five/health".to_string(),
            ..Default::default()
        },
    );

    let agents = discovery::list_monitored(MockIndexer::failing().as_ref(), chain.as_ref()).await;

    // exactly the monitored ids inside 0..20; id 21 is invisible on this path
    assert_eq!(
        agents,
        vec![
            ("3".to_string(), "http://three/health".to_string()),
            ("7".to_string(), "http://seven/health".to_string()),
            ("19".to_string(), "http://nineteen/health".to_string()),
        ]
    );
    assert_eq!(*chain.read_count.lock().unwrap(), 20);
}

#[tokio::test]
async fn reputation_prefers_indexer_then_chain_then_zeros() {
    let chain = MockChain::with_monitored(&[(1, "")]);

    let via_indexer = reputation::fetch(
        MockIndexer::with_agents(vec![]).as_ref(),
        chain.as_ref(),
        "1",
    )
    .await;
    assert!((via_indexer.mean - 4.5).abs() < 1e-9);
    assert_eq!(via_indexer.count, 3);

    let via_chain =
        reputation::fetch(MockIndexer::failing().as_ref(), chain.as_ref(), "1").await;
    assert!((via_chain.mean - 4.0).abs() < 1e-9);
    assert_eq!(via_chain.count, 2);

    // non-numeric id cannot reach the chain path
    let zeros = reputation::fetch(MockIndexer::failing().as_ref(), chain.as_ref(), "bogus").await;
    assert_eq!(zeros.count, 0);
    assert_eq!(zeros.mean, 0.0);
}
