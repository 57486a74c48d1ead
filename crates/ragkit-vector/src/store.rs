//! Persisted index snapshots in LanceDB.
//!
//! Every `save` clears the active fingerprint, writes a new snapshot table,
//! repoints the `meta` table at it and only then records the new
//! fingerprint. `load` hands back the active snapshot only when its corpus
//! fingerprint matches, so an interrupted save makes the next load miss
//! rather than return the wrong corpus.
//!
//! Public methods report failures as [`Error::Storage`].

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::ExecutableQuery;
use lancedb::Connection;
use tracing::{debug, info};

use ragkit_core::{Document, Error};

use crate::index::VectorIndex;
use crate::schema::{build_snapshot_schema, dim_i32};
use crate::table::{clear_meta, get_meta, open_db, set_meta, table_exists};

pub const META_TABLE: &str = "meta";
pub const KEY_SNAPSHOT: &str = "active_snapshot";
pub const KEY_FINGERPRINT: &str = "active_fingerprint";
pub const KEY_DIMENSION: &str = "active_dimension";

/// Rows per record batch written to a snapshot table.
const WRITE_BATCH: usize = 1000;

pub struct IndexStore {
    conn: Connection,
    uri: String,
}

impl IndexStore {
    pub async fn open(uri: &str) -> ragkit_core::Result<Self> {
        Self::try_open(uri).await.map_err(storage)
    }

    async fn try_open(uri: &str) -> Result<Self> {
        if !uri.contains("://") {
            std::fs::create_dir_all(uri).with_context(|| format!("creating store directory {uri}"))?;
        }
        let conn = open_db(uri).await?;
        Ok(Self { conn, uri: uri.to_string() })
    }

    pub fn uri(&self) -> &str { &self.uri }

    /// Writes `index` as a new snapshot and makes it active. Returns the table name.
    pub async fn save(&self, index: &VectorIndex, fingerprint: &str) -> ragkit_core::Result<String> {
        self.try_save(index, fingerprint).await.map_err(storage)
    }

    async fn try_save(&self, index: &VectorIndex, fingerprint: &str) -> Result<String> {
        clear_meta(&self.conn, META_TABLE, KEY_FINGERPRINT).await?;
        let dim = index.dimension();
        let short = fingerprint.get(..12).unwrap_or(fingerprint);
        let name = format!("snapshot_{}_{}", short, Utc::now().timestamp_nanos_opt().unwrap_or_default());
        let schema = build_snapshot_schema(dim);

        let rows: Vec<(&[f32], &Document)> = index.entries().collect();
        let mut batches = Vec::with_capacity(rows.len().div_ceil(WRITE_BATCH));
        for (n, part) in rows.chunks(WRITE_BATCH).enumerate() {
            batches.push(Ok(to_record_batch(part, n * WRITE_BATCH, dim)?));
        }
        let reader = RecordBatchIterator::new(batches.into_iter(), schema);
        self.conn.create_table(&name, Box::new(reader)).execute().await?;
        debug!(table = %name, rows = rows.len(), "snapshot written");

        set_meta(&self.conn, META_TABLE, KEY_SNAPSHOT, &name).await?;
        set_meta(&self.conn, META_TABLE, KEY_DIMENSION, &dim.to_string()).await?;
        set_meta(&self.conn, META_TABLE, KEY_FINGERPRINT, fingerprint).await?;
        info!(table = %name, rows = rows.len(), dim, "index snapshot saved");
        Ok(name)
    }

    /// The active snapshot, if it was built from a corpus with this fingerprint.
    pub async fn load(&self, fingerprint: &str) -> ragkit_core::Result<Option<VectorIndex>> {
        self.try_load(fingerprint).await.map_err(storage)
    }

    async fn try_load(&self, fingerprint: &str) -> Result<Option<VectorIndex>> {
        let active = get_meta(&self.conn, META_TABLE, KEY_FINGERPRINT).await?;
        if active.as_deref() != Some(fingerprint) {
            debug!(?active, wanted = fingerprint, "no snapshot for fingerprint");
            return Ok(None);
        }
        let Some(name) = get_meta(&self.conn, META_TABLE, KEY_SNAPSHOT).await? else {
            return Ok(None);
        };
        if !table_exists(&self.conn, &name).await? {
            return Ok(None);
        }
        let dim: usize = get_meta(&self.conn, META_TABLE, KEY_DIMENSION)
            .await?
            .ok_or_else(|| anyhow!("meta.{KEY_DIMENSION} missing"))?
            .parse()
            .context("meta.active_dimension is not a number")?;

        let table = self.conn.open_table(&name).execute().await?;
        let mut stream = table.query().execute().await?;
        let mut rows: Vec<(i64, Vec<f32>, Document)> = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            read_batch(&batch, dim, &mut rows)?;
        }
        rows.sort_by_key(|(pos, _, _)| *pos);

        let mut index = VectorIndex::new(dim)?;
        let (vectors, documents): (Vec<Vec<f32>>, Vec<Document>) = rows.into_iter().map(|(_, v, d)| (v, d)).unzip();
        index.add(&vectors, documents)?;
        info!(table = %name, rows = index.len(), "index snapshot loaded");
        Ok(Some(index))
    }

    /// Forgets the active fingerprint so the next `load` misses.
    pub async fn invalidate(&self) -> ragkit_core::Result<()> {
        clear_meta(&self.conn, META_TABLE, KEY_FINGERPRINT).await.map_err(storage)?;
        info!(uri = %self.uri, "index snapshot invalidated");
        Ok(())
    }

    pub async fn active_snapshot(&self) -> ragkit_core::Result<Option<String>> {
        get_meta(&self.conn, META_TABLE, KEY_SNAPSHOT).await.map_err(storage)
    }

    pub fn connection(&self) -> &Connection { &self.conn }
}

fn storage(err: anyhow::Error) -> Error {
    Error::Storage(format!("{err:#}"))
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn to_record_batch(rows: &[(&[f32], &Document)], first_pos: usize, dim: usize) -> Result<RecordBatch> {
    let positions: Vec<i64> = (0..rows.len()).map(|i| to_i64(first_pos + i)).collect();
    let contents: Vec<&str> = rows.iter().map(|(_, d)| d.content.as_str()).collect();
    let sources: Vec<&str> = rows.iter().map(|(_, d)| d.metadata.source.as_str()).collect();
    let chunk_ids: Vec<i64> = rows.iter().map(|(_, d)| to_i64(d.metadata.chunk_id)).collect();
    let offsets: Vec<i64> = rows.iter().map(|(_, d)| to_i64(d.metadata.start_offset)).collect();
    let vectors = rows.iter().map(|(v, _)| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));

    Ok(RecordBatch::try_new(
        build_snapshot_schema(dim),
        vec![
            Arc::new(Int64Array::from(positions)),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
            Arc::new(Int64Array::from(chunk_ids)),
            Arc::new(Int64Array::from(offsets)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim_i32(dim))),
        ],
    )?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("snapshot column '{name}' missing or mistyped"))
}

fn read_batch(batch: &RecordBatch, dim: usize, out: &mut Vec<(i64, Vec<f32>, Document)>) -> Result<()> {
    let positions = column::<Int64Array>(batch, "position")?;
    let contents = column::<StringArray>(batch, "content")?;
    let sources = column::<StringArray>(batch, "source")?;
    let chunk_ids = column::<Int64Array>(batch, "chunk_id")?;
    let offsets = column::<Int64Array>(batch, "start_offset")?;
    let vectors = column::<FixedSizeListArray>(batch, "vector")?;

    for i in 0..batch.num_rows() {
        let row = vectors.value(i);
        let values = row
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| anyhow!("snapshot vector is not float32"))?;
        if values.len() != dim {
            return Err(anyhow!("snapshot vector has length {}, expected {dim}", values.len()));
        }
        let doc = Document::new(
            contents.value(i),
            sources.value(i),
            usize::try_from(chunk_ids.value(i)).unwrap_or(0),
            usize::try_from(offsets.value(i)).unwrap_or(0),
        );
        out.push((positions.value(i), values.values().to_vec(), doc));
    }
    Ok(())
}
