use rowflow::codec::providers::NoneCodec;
use rowflow::{
    CompressionInput, CsvParser, CsvParserConfig, Error, ExtraFieldPolicy, FieldDescriptor,
    FieldType, Row, RowSchema, Value,
};
use std::io::Cursor;
use std::sync::Arc;

fn string_fields(names: &[&str]) -> Vec<FieldDescriptor> {
    names
        .iter()
        .map(|n| FieldDescriptor::new(*n, FieldType::String))
        .collect()
}

fn parser_over(
    data: &str,
    config: CsvParserConfig,
    fields: Vec<FieldDescriptor>,
) -> anyhow::Result<CsvParser> {
    let input = CompressionInput::new(
        Box::new(Cursor::new(data.as_bytes().to_vec())),
        Arc::new(NoneCodec),
    );
    let schema = RowSchema::new(fields)?;
    Ok(CsvParser::new(config, schema, input)?)
}

fn collect_rows(parser: &mut CsvParser) -> anyhow::Result<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = parser.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}

fn cell<'a>(row: &'a Row, i: usize) -> &'a str {
    row.get(i).and_then(Value::as_str).unwrap_or("<null>")
}

#[test]
fn parses_basic_rows_and_skips_header() -> anyhow::Result<()> {
    let mut parser = parser_over(
        "name,city\nalice,berlin\nbob,lyon\n",
        CsvParserConfig::default(),
        string_fields(&["name", "city"]),
    )?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&rows[0], 0), "alice");
    assert_eq!(cell(&rows[0], 1), "berlin");
    assert_eq!(cell(&rows[1], 0), "bob");
    assert_eq!(cell(&rows[1], 1), "lyon");
    assert_eq!(parser.rows_emitted(), 2);
    Ok(())
}

#[test]
fn header_row_is_not_emitted_as_data() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("a,b\nc,d\n", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    // Without header handling the first physical row is data.
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&rows[0], 0), "a");
    Ok(())
}

#[test]
fn quoted_field_holds_delimiter_and_raw_terminator() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over(
        "\"a,b\nc\",next\nplain,row\n",
        config,
        string_fields(&["x", "y"]),
    )?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows.len(), 2);
    // The embedded delimiter and the embedded LF survive verbatim.
    assert_eq!(cell(&rows[0], 0), "a,b\nc");
    assert_eq!(cell(&rows[0], 1), "next");
    assert_eq!(cell(&rows[1], 0), "plain");
    Ok(())
}

#[test]
fn quoted_field_holds_embedded_crlf_verbatim() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("\"a\r\nb\",x\n", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(cell(&rows[0], 0), "a\r\nb");
    Ok(())
}

#[test]
fn doubled_enclosure_is_a_literal_quote() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over(
        "\"say \"\"hi\"\"\",x\n",
        config,
        string_fields(&["a", "b"]),
    )?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(cell(&rows[0], 0), "say \"hi\"");
    assert_eq!(cell(&rows[0], 1), "x");
    Ok(())
}

#[test]
fn all_terminator_conventions_count_one_row_each() -> anyhow::Result<()> {
    for (terminator, label) in [("\r\n", "crlf"), ("\n", "lf"), ("\r", "cr")] {
        let data = format!("a,b{terminator}c,d{terminator}e,f{terminator}");
        let config = CsvParserConfig {
            has_header: false,
            ..Default::default()
        };
        let mut parser = parser_over(&data, config, string_fields(&["x", "y"]))?;
        let rows = collect_rows(&mut parser)?;
        assert_eq!(rows.len(), 3, "{label}");
        assert_eq!(cell(&rows[2], 0), "e", "{label}");
        // Three rows, three terminators: the cursor sits on line 4.
        assert_eq!(parser.line_number(), 4, "{label}");
    }
    Ok(())
}

#[test]
fn trailing_terminator_produces_no_phantom_row() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("a,b\n", config, string_fields(&["x", "y"]))?;
    assert!(parser.next_row()?.is_some());
    assert!(parser.next_row()?.is_none());
    // Terminal state is sticky.
    assert!(parser.next_row()?.is_none());
    Ok(())
}

#[test]
fn final_row_without_terminator_is_flushed() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("a,b\nc,d", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&rows[1], 1), "d");
    Ok(())
}

#[test]
fn short_row_pads_nulls_when_not_strict() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("a\n", config, string_fields(&["x", "y", "z"]))?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows[0].len(), 3);
    assert_eq!(cell(&rows[0], 0), "a");
    assert!(rows[0].get(1).is_none());
    assert!(rows[0].get(2).is_none());
    Ok(())
}

#[test]
fn short_row_fails_when_strict() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        strict: true,
        ..Default::default()
    };
    let mut parser = parser_over("a\n", config, string_fields(&["x", "y"]))?;
    let err = parser.next_row().unwrap_err();
    assert!(matches!(err, Error::Conversion { line: 1, .. }));
    Ok(())
}

#[test]
fn extra_fields_truncate_by_default() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("a,b,c,d\n", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows[0].len(), 2);
    assert_eq!(cell(&rows[0], 1), "b");
    Ok(())
}

#[test]
fn extra_fields_error_policy_fails_the_row() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        extra_fields: ExtraFieldPolicy::Error,
        ..Default::default()
    };
    let mut parser = parser_over("a,b,c\n", config, string_fields(&["x", "y"]))?;
    assert!(matches!(
        parser.next_row().unwrap_err(),
        Error::Conversion { .. }
    ));
    Ok(())
}

#[test]
fn typed_columns_convert() -> anyhow::Result<()> {
    let fields = vec![
        FieldDescriptor::new("id", FieldType::Integer),
        FieldDescriptor::new("score", FieldType::Number),
        FieldDescriptor::new("active", FieldType::Boolean),
    ];
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("7,1.5,yes\n", config, fields)?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows[0].get(0), Some(&Value::Integer(7)));
    assert_eq!(rows[0].get(1), Some(&Value::Number(1.5)));
    assert_eq!(rows[0].get(2), Some(&Value::Boolean(true)));
    Ok(())
}

#[test]
fn strict_conversion_error_names_the_line() -> anyhow::Result<()> {
    let fields = vec![FieldDescriptor::new("id", FieldType::Integer)];
    let config = CsvParserConfig {
        has_header: false,
        strict: true,
        ..Default::default()
    };
    let mut parser = parser_over("1\n2\nnope\n", config, fields)?;
    assert!(parser.next_row()?.is_some());
    assert!(parser.next_row()?.is_some());
    match parser.next_row().unwrap_err() {
        Error::Conversion { line, field, .. } => {
            assert_eq!(line, 3);
            assert_eq!(field, "id");
        }
        other => panic!("expected conversion error, got {other}"),
    }
    Ok(())
}

#[test]
fn non_strict_conversion_substitutes_default_or_null() -> anyhow::Result<()> {
    let fields = vec![
        FieldDescriptor::new("id", FieldType::Integer).with_default("-1"),
        FieldDescriptor::new("n", FieldType::Integer),
    ];
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("bad,alsobad\n", config, fields)?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows[0].get(0), Some(&Value::Integer(-1)));
    assert!(rows[0].get(1).is_none());
    Ok(())
}

#[test]
fn custom_delimiter_and_enclosure() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        delimiter: ';',
        enclosure: '\'',
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("'a;b';c\n", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(cell(&rows[0], 0), "a;b");
    assert_eq!(cell(&rows[0], 1), "c");
    Ok(())
}

#[test]
fn empty_quoted_cell_is_null() -> anyhow::Result<()> {
    let config = CsvParserConfig {
        has_header: false,
        ..Default::default()
    };
    let mut parser = parser_over("\"\",b\n", config, string_fields(&["x", "y"]))?;
    let rows = collect_rows(&mut parser)?;
    assert!(rows[0].get(0).is_none());
    assert_eq!(cell(&rows[0], 1), "b");
    Ok(())
}

#[test]
fn config_rejects_delimiter_equal_to_enclosure() {
    let config = CsvParserConfig {
        delimiter: '"',
        ..Default::default()
    };
    let err = parser_over("a\n", config, string_fields(&["x"])).unwrap_err();
    let err = err.downcast::<Error>().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn config_rejects_unknown_encoding() {
    let config = CsvParserConfig {
        encoding: "EBCDIC-37".into(),
        ..Default::default()
    };
    let err = parser_over("a\n", config, string_fields(&["x"])).unwrap_err();
    let err = err.downcast::<Error>().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn config_rejects_zero_buffer_size() {
    let config = CsvParserConfig {
        buffer_size: 0,
        ..Default::default()
    };
    let err = parser_over("a\n", config, string_fields(&["x"])).unwrap_err();
    let err = err.downcast::<Error>().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn config_rejects_empty_field_list() {
    let err = parser_over("a\n", CsvParserConfig::default(), Vec::new()).unwrap_err();
    let err = err.downcast::<Error>().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn tiny_buffer_still_parses_correctly() -> anyhow::Result<()> {
    // Forces many chunk refills, including mid-field and mid-terminator.
    let config = CsvParserConfig {
        has_header: false,
        buffer_size: 2,
        ..Default::default()
    };
    let mut parser = parser_over(
        "alpha,beta\r\ngamma,delta\r\n",
        config,
        string_fields(&["x", "y"]),
    )?;
    let rows = collect_rows(&mut parser)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(cell(&rows[1], 1), "delta");
    Ok(())
}
