use ragkit_core::{Document, Error};
use ragkit_vector::VectorIndex;

fn doc(i: usize) -> Document {
    Document::new(format!("document number {i}"), "test", i, i * 10)
}

fn unit(dim: usize, hot: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[hot] = 1.0;
    v
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(matches!(VectorIndex::new(0), Err(Error::InvalidConfig(_))));
}

#[test]
fn search_ranks_by_inner_product() {
    let mut index = VectorIndex::new(3).unwrap();
    let vectors = vec![vec![1.0, 0.0, 0.0], vec![0.6, 0.8, 0.0], vec![0.0, 0.0, 1.0]];
    index.add(&vectors, (0..3).map(doc).collect()).unwrap();

    let hits = index.search(&[0.0, 1.0, 0.0], 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].document.metadata.chunk_id, 1);
    assert!((hits[0].score - 0.8).abs() < 1e-6);
    assert!(hits[0].score >= hits[1].score);
}

#[test]
fn top_k_is_capped_and_zero_gives_nothing() {
    let mut index = VectorIndex::new(4).unwrap();
    index.add(&[unit(4, 0), unit(4, 1)], vec![doc(0), doc(1)]).unwrap();
    assert_eq!(index.search(&unit(4, 0), 10).unwrap().len(), 2);
    assert!(index.search(&unit(4, 0), 0).unwrap().is_empty());
}

#[test]
fn empty_index_returns_no_results() {
    let index = VectorIndex::new(8).unwrap();
    assert!(index.is_empty());
    assert!(index.search(&unit(8, 3), 5).unwrap().is_empty());
    assert_eq!(index.stats().total_vectors, 0);
}

#[test]
fn ties_keep_insertion_order() {
    let mut index = VectorIndex::new(2).unwrap();
    let same = vec![vec![1.0, 0.0]; 5];
    index.add(&same, (0..5).map(doc).collect()).unwrap();

    let hits = index.search(&[1.0, 0.0], 3).unwrap();
    let ids: Vec<usize> = hits.iter().map(|h| h.document.metadata.chunk_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn bad_rows_are_rejected_without_partial_insert() {
    let mut index = VectorIndex::new(3).unwrap();
    index.add(&[unit(3, 0)], vec![doc(0)]).unwrap();

    let err = index.add(&[unit(3, 1), vec![1.0, 0.0]], vec![doc(1), doc(2)]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
    assert!(matches!(index.add(&[unit(3, 1)], vec![]), Err(Error::DimensionMismatch { .. })));
    assert_eq!(index.len(), 1);

    let err = index.search(&[1.0, 0.0], 1).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
}

#[test]
fn stats_and_entries_reflect_contents() {
    let mut index = VectorIndex::new(4).unwrap();
    index.add(&[unit(4, 0), unit(4, 2), unit(4, 3)], (0..3).map(doc).collect()).unwrap();

    let stats = index.stats();
    assert_eq!((stats.total_vectors, stats.dimension, stats.total_documents), (3, 4, 3));
    let hot: Vec<usize> = index.entries().map(|(v, _)| v.iter().position(|x| *x == 1.0).unwrap()).collect();
    assert_eq!(hot, vec![0, 2, 3]);
}

#[test]
fn results_are_sorted_descending() {
    let mut index = VectorIndex::new(2).unwrap();
    let vectors: Vec<Vec<f32>> = (0..20)
        .map(|i| {
            let a = i as f32 * 0.07;
            vec![a.cos(), a.sin()]
        })
        .collect();
    index.add(&vectors, (0..20).map(doc).collect()).unwrap();

    let hits = index.search(&[0.0, 1.0], 7).unwrap();
    assert_eq!(hits.len(), 7);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(hits[0].document.metadata.chunk_id, 19);
}
