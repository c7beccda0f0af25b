use ragkit_core::traits::Embedder;
use ragkit_embed::HashingEmbedder;

fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

#[test]
fn hashing_embedder_shapes_and_determinism() {
    let embedder = HashingEmbedder::new(64).expect("embedder");
    let texts = vec!["hello world".to_string(), "Hello,  WORLD".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");

    assert_eq!(embs.len(), 2);
    assert_eq!(embs[0].len(), 64, "embedding dim is 64");

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Same tokens after normalization give the same vector
    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn shared_vocabulary_scores_higher() {
    let embedder = HashingEmbedder::default();
    let embs = embedder
        .embed_batch(&[
            "refund policy for returned items".to_string(),
            "what is the refund policy".to_string(),
            "carrier shipping schedule".to_string(),
        ])
        .expect("embed_batch");
    assert!(dot(&embs[0], &embs[1]) > dot(&embs[0], &embs[2]));
}

#[test]
fn text_without_tokens_embeds_to_zero() {
    let embedder = HashingEmbedder::default().with_max_len(8);
    assert_eq!(embedder.max_len(), 8);
    let embs = embedder.embed_batch(&["...".to_string()]).expect("embed_batch");
    assert!(embs[0].iter().all(|x| *x == 0.0));
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(HashingEmbedder::new(0).is_err());
}
