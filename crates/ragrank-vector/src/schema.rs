use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const ID_COL: &str = "id";
pub const TEXT_COL: &str = "text";
pub const SOURCE_COL: &str = "source";
pub const ORDER_COL: &str = "chunk_order";
pub const METADATA_COL: &str = "metadata";
pub const VECTOR_COL: &str = "vector";
pub const DISTANCE_COL: &str = "_distance";

/// Chunk table layout. `metadata` is a JSON object serialized as text; the
/// vector is nullable so chunks can be stored before they are embedded.
pub fn build_chunk_schema(dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(ID_COL, DataType::Utf8, false),
        Field::new(TEXT_COL, DataType::Utf8, false),
        Field::new(SOURCE_COL, DataType::Utf8, true),
        Field::new(ORDER_COL, DataType::UInt32, true),
        Field::new(METADATA_COL, DataType::Utf8, true),
        Field::new(
            VECTOR_COL,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32),
            true,
        ),
    ]))
}
