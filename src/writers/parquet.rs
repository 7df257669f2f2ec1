use crate::error::{IngestError, Result};
use crate::store::{Column, ColumnKind, Row, Table};
use crate::utils::constants::DEFAULT_ROW_GROUP_SIZE;
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            "snappy" => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            "none" => Compression::UNCOMPRESSED,
            _ => {
                return Err(IngestError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Persist a table to its canonical Parquet file. The caller decides
    /// whether empty tables are written at all.
    pub fn write_table(&self, table: &Table, path: &Path) -> Result<()> {
        let schema = table_schema(table);
        let batch = table_to_batch(table, schema.clone())?;

        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
        writer.write(&batch)?;
        writer.close()?;

        Ok(())
    }

    /// Row-group statistics for the info command.
    pub fn file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            row_group_sizes.push(metadata.row_group(i).num_rows());
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Rows: {}\nRow groups: {} {:?}\nFile size: {:.2} MB",
            self.total_rows,
            self.row_groups,
            self.row_group_sizes,
            self.file_size as f64 / (1024.0 * 1024.0)
        )
    }
}

pub struct ParquetReader;

impl ParquetReader {
    pub fn new() -> Self {
        Self
    }

    /// Load a full Parquet file as a table, with column types inferred from
    /// the file schema via the same name convention used at creation.
    pub fn read_table(&self, path: &Path, name: &str) -> Result<Table> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let columns: Vec<Column> = builder
            .schema()
            .fields()
            .iter()
            .map(|f| Column {
                name: f.name().clone(),
                kind: ColumnKind::from_column_name(f.name()),
            })
            .collect();
        let mut table = Table::with_columns(name, columns);

        for batch_result in builder.build()? {
            append_batch_rows(&mut table, &batch_result?)?;
        }

        Ok(table)
    }
}

impl Default for ParquetReader {
    fn default() -> Self {
        Self::new()
    }
}

fn table_schema(table: &Table) -> Arc<Schema> {
    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| match c.kind {
            ColumnKind::Text => Field::new(&c.name, DataType::Utf8, true),
            ColumnKind::Timestamp => Field::new(
                &c.name,
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            ColumnKind::Integer => Field::new(&c.name, DataType::Int32, true),
            ColumnKind::Float => Field::new(&c.name, DataType::Float32, true),
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn table_to_batch(table: &Table, schema: Arc<Schema>) -> Result<RecordBatch> {
    let rows = table.rows();
    let mut arrays: Vec<Arc<dyn Array>> = Vec::with_capacity(table.columns().len());
    let mut measurement_slot = 0;

    for column in table.columns() {
        let array: Arc<dyn Array> = match column.kind {
            ColumnKind::Text => {
                let values: Vec<Option<&str>> = rows.iter().map(|r| r.acronym.as_deref()).collect();
                Arc::new(StringArray::from(values))
            }
            ColumnKind::Timestamp => {
                let values: Vec<Option<i64>> = rows
                    .iter()
                    .map(|r| r.timestamp.map(|ts| ts.and_utc().timestamp_micros()))
                    .collect();
                Arc::new(TimestampMicrosecondArray::from(values))
            }
            ColumnKind::Integer => {
                let values: Vec<Option<i32>> = rows
                    .iter()
                    .map(|r| match column.name.as_str() {
                        "year" => r.year,
                        "day" => r.day,
                        "min" => r.min,
                        _ => None,
                    })
                    .collect();
                Arc::new(Int32Array::from(values))
            }
            ColumnKind::Float => {
                let slot = measurement_slot;
                measurement_slot += 1;
                let values: Vec<Option<f32>> =
                    rows.iter().map(|r| r.values.get(slot).copied().flatten()).collect();
                Arc::new(Float32Array::from(values))
            }
        };
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(schema, arrays)?)
}

fn append_batch_rows(table: &mut Table, batch: &RecordBatch) -> Result<()> {
    let num_rows = batch.num_rows();
    let columns: Vec<Column> = table.columns().to_vec();
    let measurement_count = table.measurement_columns().len();

    for i in 0..num_rows {
        let mut row = Row {
            acronym: None,
            timestamp: None,
            year: None,
            day: None,
            min: None,
            values: vec![None; measurement_count],
        };
        let mut measurement_slot = 0;

        for (col_idx, column) in columns.iter().enumerate() {
            let array = batch.column(col_idx);
            match column.kind {
                ColumnKind::Text => {
                    row.acronym = read_string(array, i);
                }
                ColumnKind::Timestamp => {
                    row.timestamp = read_timestamp(array, i, &column.name)?;
                }
                ColumnKind::Integer => {
                    let value = read_int(array, i, &column.name)?;
                    match column.name.as_str() {
                        "year" => row.year = value,
                        "day" => row.day = value,
                        "min" => row.min = value,
                        _ => {}
                    }
                }
                ColumnKind::Float => {
                    row.values[measurement_slot] = read_float(array, i, &column.name)?;
                    measurement_slot += 1;
                }
            }
        }

        table.append_row(row)?;
    }

    Ok(())
}

fn read_string(array: &Arc<dyn Array>, i: usize) -> Option<String> {
    let strings = array.as_any().downcast_ref::<StringArray>()?;
    if strings.is_null(i) {
        None
    } else {
        Some(strings.value(i).to_string())
    }
}

fn read_timestamp(array: &Arc<dyn Array>, i: usize, name: &str) -> Result<Option<NaiveDateTime>> {
    if array.is_null(i) {
        return Ok(None);
    }
    let micros = if let Some(a) = array.as_any().downcast_ref::<TimestampMicrosecondArray>() {
        a.value(i)
    } else if let Some(a) = array.as_any().downcast_ref::<TimestampMillisecondArray>() {
        a.value(i) * 1_000
    } else if let Some(a) = array.as_any().downcast_ref::<TimestampSecondArray>() {
        a.value(i) * 1_000_000
    } else if let Some(a) = array.as_any().downcast_ref::<TimestampNanosecondArray>() {
        a.value(i) / 1_000
    } else {
        return Err(IngestError::InvalidFormat(format!(
            "column {} is not a timestamp column",
            name
        )));
    };
    Ok(DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc()))
}

fn read_int(array: &Arc<dyn Array>, i: usize, name: &str) -> Result<Option<i32>> {
    if array.is_null(i) {
        return Ok(None);
    }
    if let Some(a) = array.as_any().downcast_ref::<Int32Array>() {
        Ok(Some(a.value(i)))
    } else if let Some(a) = array.as_any().downcast_ref::<Int64Array>() {
        Ok(Some(a.value(i) as i32))
    } else {
        Err(IngestError::InvalidFormat(format!(
            "column {} is not an integer column",
            name
        )))
    }
}

fn read_float(array: &Arc<dyn Array>, i: usize, name: &str) -> Result<Option<f32>> {
    if array.is_null(i) {
        return Ok(None);
    }
    if let Some(a) = array.as_any().downcast_ref::<Float32Array>() {
        Ok(Some(a.value(i)))
    } else if let Some(a) = array.as_any().downcast_ref::<Float64Array>() {
        Ok(Some(a.value(i) as f32))
    } else if let Some(a) = array.as_any().downcast_ref::<Int32Array>() {
        Ok(Some(a.value(i) as f32))
    } else if let Some(a) = array.as_any().downcast_ref::<Int64Array>() {
        Ok(Some(a.value(i) as f32))
    } else {
        Err(IngestError::InvalidFormat(format!(
            "column {} is not a numeric column",
            name
        )))
    }
}
