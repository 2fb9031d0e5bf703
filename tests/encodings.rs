//! The same logical CSV body must parse identically under single-byte,
//! UTF-8, and both 16-bit byte orders, for every line-ending convention.

use rowflow::codec::providers::NoneCodec;
use rowflow::{
    CompressionInput, CsvParser, CsvParserConfig, FieldDescriptor, FieldType, RowSchema, Value,
};
use std::io::Cursor;
use std::sync::Arc;

const ENCODINGS: [&str; 4] = ["windows-1252", "UTF-8", "UTF-16LE", "UTF-16BE"];
const TERMINATORS: [&str; 3] = ["\r\n", "\n", "\r"];

fn encode(text: &str, encoding: &str) -> Vec<u8> {
    match encoding {
        "UTF-16LE" => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        "UTF-16BE" => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        // The fixture text is ASCII, so windows-1252 and UTF-8 share bytes.
        _ => text.as_bytes().to_vec(),
    }
}

fn parser_for(bytes: Vec<u8>, encoding: &str, buffer_size: usize) -> anyhow::Result<CsvParser> {
    let schema = RowSchema::new(vec![
        FieldDescriptor::new("Field1", FieldType::String),
        FieldDescriptor::new("Field2", FieldType::String),
    ])?;
    let config = CsvParserConfig {
        delimiter: '\t',
        encoding: encoding.to_string(),
        has_header: true,
        ..Default::default()
    };
    let input = CompressionInput::new(Box::new(Cursor::new(bytes)), Arc::new(NoneCodec));
    Ok(CsvParser::new(config, schema, input)?)
}

fn assert_two_rows_of_value(parser: &mut CsvParser, context: &str) -> anyhow::Result<()> {
    let mut rows = Vec::new();
    while let Some(row) = parser.next_row()? {
        rows.push(row);
    }
    assert_eq!(rows.len(), 2, "{context}");
    for row in &rows {
        assert_eq!(row.len(), 2, "{context}");
        for i in 0..2 {
            assert_eq!(
                row.get(i).and_then(Value::as_str),
                Some("Value"),
                "{context}"
            );
        }
    }
    assert_eq!(parser.rows_emitted(), 2, "{context}");
    Ok(())
}

#[test]
fn header_and_two_rows_across_encodings_and_terminators() -> anyhow::Result<()> {
    for encoding in ENCODINGS {
        for terminator in TERMINATORS {
            let text =
                format!("Header1\tHeader2{terminator}Value\tValue{terminator}Value\tValue{terminator}");
            let mut parser = parser_for(encode(&text, encoding), encoding, 50_000)?;
            assert_two_rows_of_value(&mut parser, &format!("{encoding} / {terminator:?}"))?;
        }
    }
    Ok(())
}

#[test]
fn multibyte_sequences_survive_chunk_boundary_splits() -> anyhow::Result<()> {
    // An odd 3-byte buffer guarantees every UTF-16 read ends mid code unit,
    // and the CRLF pair regularly straddles two chunks.
    for encoding in ["UTF-16LE", "UTF-16BE"] {
        let text = "Header1\tHeader2\r\nValue\tValue\r\nValue\tValue\r\n";
        let mut parser = parser_for(encode(text, encoding), encoding, 3)?;
        assert_two_rows_of_value(&mut parser, &format!("{encoding} / tiny buffer"))?;
    }
    Ok(())
}

#[test]
fn single_byte_encoding_decodes_non_ascii() -> anyhow::Result<()> {
    // "café,1" in windows-1252: e-acute is a single 0xE9 byte.
    let bytes = b"caf\xe9,x\n".to_vec();
    let schema = RowSchema::new(vec![
        FieldDescriptor::new("word", FieldType::String),
        FieldDescriptor::new("tag", FieldType::String),
    ])?;
    let config = CsvParserConfig {
        encoding: "windows-1252".to_string(),
        has_header: false,
        ..Default::default()
    };
    let input = CompressionInput::new(Box::new(Cursor::new(bytes)), Arc::new(NoneCodec));
    let mut parser = CsvParser::new(config, schema, input)?;
    let row = parser.next_row()?.expect("one row");
    assert_eq!(row.get(0).and_then(Value::as_str), Some("café"));
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn utf16_content_reads_through_gzip() -> anyhow::Result<()> {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rowflow::codec::providers::GzipCodec;
    use std::io::Write;

    let text = "Header1\tHeader2\r\nValue\tValue\r\nValue\tValue\r\n";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&encode(text, "UTF-16LE"))?;
    let compressed = encoder.finish()?;

    let schema = RowSchema::new(vec![
        FieldDescriptor::new("Field1", FieldType::String),
        FieldDescriptor::new("Field2", FieldType::String),
    ])?;
    let config = CsvParserConfig {
        delimiter: '\t',
        encoding: "UTF-16LE".to_string(),
        has_header: true,
        ..Default::default()
    };
    let input = CompressionInput::new(Box::new(Cursor::new(compressed)), Arc::new(GzipCodec));
    let mut parser = CsvParser::new(config, schema, input)?;
    assert_two_rows_of_value(&mut parser, "UTF-16LE / gzip")?;
    Ok(())
}
