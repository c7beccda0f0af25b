use ragkit_core::Error;
use ragkit_text::Bm25Index;

fn corpus() -> Vec<&'static str> {
    vec![
        "Our refund policy covers returned items within thirty days.",
        "Shipping times depend on the carrier and the destination.",
        "Refund requests need the original receipt and order number.",
        "La política de devolución aplica a pedidos nacionales.",
    ]
}

#[test]
fn empty_corpus_is_a_configuration_error() {
    let err = Bm25Index::build(Vec::<String>::new()).err().expect("empty corpus must fail");
    assert!(matches!(err, Error::EmptyCorpus(_)));
    assert!(err.is_configuration());
}

#[test]
fn chunks_matching_more_terms_rank_first() {
    let index = Bm25Index::build(corpus()).expect("index");
    assert_eq!(index.len(), 4);

    let hits = index.search("refund policy", 2).expect("search");
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![0, 2]);
    assert!(hits[0].score > hits[1].score);
    assert!(hits[1].score > 0.0);
}

#[test]
fn non_matching_chunks_pad_in_corpus_order() {
    let index = Bm25Index::build(corpus()).expect("index");
    let hits = index.search("receipt", 3).expect("search");
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].index, 2);
    assert_eq!((hits[1].index, hits[1].score), (0, 0.0));
    assert_eq!((hits[2].index, hits[2].score), (1, 0.0));
}

#[test]
fn top_k_is_capped_by_corpus_size() {
    let index = Bm25Index::build(corpus()).expect("index");
    assert_eq!(index.search("shipping", 50).expect("search").len(), 4);
    assert!(index.search("shipping", 0).expect("search").is_empty());

    let all = index.search("refund policy", usize::MAX).expect("search");
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].index, 0);
}

#[test]
fn accents_and_case_match_across_query_and_corpus() {
    let index = Bm25Index::build(corpus()).expect("index");
    let hits = index.search("POLÍTICA", 1).expect("search");
    assert_eq!(hits[0].index, 3);
    assert!(hits[0].score > 0.0);
}

#[test]
fn equal_scores_keep_corpus_order() {
    let index = Bm25Index::build(["alpha beta", "gamma delta", "alpha beta"]).expect("index");
    let hits = index.search("alpha", 3).expect("search");
    let order: Vec<usize> = hits.iter().map(|h| h.index).collect();
    assert_eq!(order, vec![0, 2, 1]);
    assert_eq!(hits[0].score, hits[1].score);
}

#[test]
fn query_without_terms_returns_corpus_prefix() {
    let index = Bm25Index::build(corpus()).expect("index");
    let hits = index.search("?!", 2).expect("search");
    assert_eq!(hits.iter().map(|h| (h.index, h.score)).collect::<Vec<_>>(), vec![(0, 0.0), (1, 0.0)]);
}
