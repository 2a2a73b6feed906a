use std::path::PathBuf;

use clap::error::ErrorKind;
use record_opt::{
    Action, Converter, Declaration, Field, FromRecord, Nargs, ParseError, Record, RecordError,
    RecordParser, SUPPRESS, ScalarType, Schema, SchemaError, TypeExpr, UnsupportedFeature, Value,
};

fn schema(fields: Vec<Field>) -> Schema {
    Schema::builder("Test").fields(fields).build().unwrap()
}

fn parser_for(fields: Vec<Field>) -> RecordParser {
    RecordParser::new("test").with_root(schema(fields)).unwrap()
}

fn parse(parser: &RecordParser, args: &[&str]) -> Record {
    let outcome = parser
        .try_parse_args_from(args.iter().copied())
        .unwrap_or_else(|err| panic!("parse of {args:?} failed: {err}"));
    outcome.root().cloned().expect("root record")
}

fn parse_err(parser: &RecordParser, args: &[&str]) -> ErrorKind {
    match parser.try_parse_args_from(args.iter().copied()) {
        Err(ParseError::Usage(err)) => err.kind(),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(outcome) => panic!("parse of {args:?} succeeded: {outcome:?}"),
    }
}

fn record() -> Record {
    Record::new("Test")
}

#[test]
fn test_no_fields() {
    let parser = parser_for(vec![]);
    assert_eq!(parse(&parser, &[]), record());
    assert_eq!(parse_err(&parser, &["--name", "Jim"]), ErrorKind::UnknownArgument);
}

#[test]
fn test_required_args() {
    let parser = parser_for(vec![
        Field::new("string", TypeExpr::STR),
        Field::new("integer", TypeExpr::INT),
    ]);
    assert_eq!(
        parse(&parser, &["abc", "10"]),
        record().with("string", "abc").with("integer", 10)
    );
    assert_eq!(
        parse_err(&parser, &["abc"]),
        ErrorKind::MissingRequiredArgument
    );
}

#[test]
fn test_optional_args() {
    let parser = parser_for(vec![
        Field::new("string", TypeExpr::STR).default("abc"),
        Field::new("integer", TypeExpr::INT).default(10),
    ]);
    assert_eq!(
        parse(&parser, &[]),
        record().with("string", "abc").with("integer", 10)
    );
    assert_eq!(
        parse(&parser, &["foo"]),
        record().with("string", "foo").with("integer", 10)
    );
}

#[test]
fn test_required_and_optional() {
    let parser = parser_for(vec![
        Field::new("bar", TypeExpr::STR),
        Field::opt("foo", TypeExpr::STR),
    ]);
    let expected = record().with("bar", "BAR").with("foo", "FOO");
    assert_eq!(parse(&parser, &["BAR", "--foo", "FOO"]), expected);
    assert_eq!(parse(&parser, &["BAR", "-f", "FOO"]), expected);
}

#[test]
fn test_optional_no_short() {
    let parser = parser_for(vec![Field::opt("foo", TypeExpr::STR).no_short()]);
    assert_eq!(parse(&parser, &["--foo", "FOO"]), record().with("foo", "FOO"));
    assert_eq!(parse_err(&parser, &["-f", "FOO"]), ErrorKind::UnknownArgument);
}

#[test]
fn test_optional_no_long() {
    let parser = parser_for(vec![Field::opt("foo", TypeExpr::STR).no_long()]);
    assert_eq!(parse(&parser, &["-f", "FOO"]), record().with("foo", "FOO"));
    assert_eq!(parse_err(&parser, &["--foo", "FOO"]), ErrorKind::UnknownArgument);
}

#[test]
fn test_store_const_optional() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::optional(TypeExpr::INT))
            .action(Action::StoreConst)
            .constant(42),
    ]);
    assert_eq!(parse(&parser, &["--foo"]), record().with("foo", 42));
    assert_eq!(parse(&parser, &["-f"]), record().with("foo", 42));
    assert_eq!(parse(&parser, &[]), record().with("foo", Value::None));
}

#[test]
fn test_store_const_with_default() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::INT)
            .action(Action::StoreConst)
            .constant(42)
            .default(41),
    ]);
    assert_eq!(parse(&parser, &["--foo"]), record().with("foo", 42));
    assert_eq!(parse(&parser, &["-f"]), record().with("foo", 42));
    assert_eq!(parse(&parser, &[]), record().with("foo", 41));
}

#[test]
fn test_store_true_false() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::BOOL).no_short(),
        Field::opt("bar", TypeExpr::BOOL).no_short().action(Action::StoreFalse),
        Field::opt("baz", TypeExpr::BOOL).no_short().action(Action::StoreFalse),
    ]);
    assert_eq!(
        parse(&parser, &["--foo", "--bar"]),
        record().with("foo", true).with("bar", false).with("baz", true)
    );
    assert_eq!(
        parse(&parser, &[]),
        record().with("foo", false).with("bar", true).with("baz", true)
    );
}

#[test]
fn test_append_str() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::STR)).action(Action::Append),
    ]);
    assert_eq!(
        parse(&parser, &["--foo", "1", "--foo", "2"]),
        record().with("foo", vec!["1", "2"])
    );
}

#[test]
fn test_append_int() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::INT)).action(Action::Append),
    ]);
    assert_eq!(
        parse(&parser, &["--foo", "1", "--foo", "2"]),
        record().with("foo", vec![1, 2])
    );
}

#[test]
fn test_append_extends_default() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::STR))
            .action(Action::Append)
            .default(vec!["a"]),
    ]);
    assert_eq!(
        parse(&parser, &["--foo", "b"]),
        record().with("foo", vec!["a", "b"])
    );
    assert_eq!(parse(&parser, &[]), record().with("foo", vec!["a"]));
}

#[test]
fn test_append_const() {
    let test = schema(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::INT)).action(Action::AppendConst),
    ]);
    let err = RecordParser::new("test").with_root(test).unwrap_err();
    assert_eq!(
        err,
        SchemaError::Unsupported {
            field: "foo".to_string(),
            feature: UnsupportedFeature::AppendConst,
        }
    );
}

#[test]
fn test_count() {
    let parser = parser_for(vec![
        Field::opt("verbose", TypeExpr::INT)
            .action(Action::Count)
            .default(0),
    ]);
    assert_eq!(parse(&parser, &["-vvv"]), record().with("verbose", 3));
    assert_eq!(parse(&parser, &[]), record().with("verbose", 0));
}

#[test]
fn test_version() {
    let parser = RecordParser::new("test")
        .with_root(schema(vec![]))
        .unwrap()
        .with_version("1.0")
        .unwrap();
    assert_eq!(parse_err(&parser, &["--version"]), ErrorKind::DisplayVersion);
    assert_eq!(parse(&parser, &[]), record());
}

#[test]
fn test_nargs() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::Exactly(2)),
        Field::arg("bar", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::Exactly(1)),
    ]);
    assert_eq!(
        parse(&parser, &["c", "--foo", "a", "b"]),
        record().with("foo", vec!["a", "b"]).with("bar", vec!["c"])
    );
}

#[test]
fn test_nargs_optional() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::STR)
            .nargs(Nargs::Optional)
            .constant("c")
            .default("d"),
        Field::arg("bar", TypeExpr::STR).nargs(Nargs::Optional).default("d"),
    ]);
    assert_eq!(
        parse(&parser, &["XX", "--foo", "YY"]),
        record().with("foo", "YY").with("bar", "XX")
    );
    assert_eq!(
        parse(&parser, &["XX", "--foo"]),
        record().with("foo", "c").with("bar", "XX")
    );
    assert_eq!(parse(&parser, &[]), record().with("foo", "d").with("bar", "d"));
}

#[test]
fn test_nargs_star() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::ZeroOrMore),
        Field::opt("bar", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::ZeroOrMore),
        Field::arg("baz", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::ZeroOrMore),
    ]);
    assert_eq!(
        parse(&parser, &["a", "b", "--foo", "x", "y", "--bar", "1", "2"]),
        record()
            .with("foo", vec!["x", "y"])
            .with("bar", vec!["1", "2"])
            .with("baz", vec!["a", "b"])
    );
}

#[test]
fn test_nargs_plus() {
    let parser = parser_for(vec![
        Field::arg("foo", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::OneOrMore),
    ]);
    assert_eq!(
        parse(&parser, &["a", "b", "c"]),
        record().with("foo", vec!["a", "b", "c"])
    );
    assert_eq!(parse_err(&parser, &[]), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_repeated_field_defaults_to_one_or_more() {
    let parser = parser_for(vec![Field::new("files", TypeExpr::list(TypeExpr::PATH))]);
    assert_eq!(
        parse(&parser, &["a.txt", "b.txt"]),
        record().with(
            "files",
            vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]
        )
    );
    assert_eq!(parse_err(&parser, &[]), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_default() {
    let parser = parser_for(vec![Field::opt("foo", TypeExpr::INT).default(42)]);
    assert_eq!(parse(&parser, &["--foo", "2"]), record().with("foo", 2));
    assert_eq!(parse(&parser, &[]), record().with("foo", 42));
}

#[test]
fn test_default_conversions() {
    let parser = parser_for(vec![
        Field::opt("length", TypeExpr::INT).default("10"),
        Field::opt("width", TypeExpr::INT).default(10.5),
    ]);
    assert_eq!(
        parse(&parser, &[]),
        record().with("length", 10).with("width", 10.5)
    );
}

#[test]
fn test_default_factory() {
    let parser = parser_for(vec![
        Field::opt("tags", TypeExpr::list(TypeExpr::STR))
            .default_factory(|| Value::from(vec!["stable"])),
    ]);
    assert_eq!(parse(&parser, &[]), record().with("tags", vec!["stable"]));
    assert_eq!(
        parse(&parser, &["--tags", "a", "b"]),
        record().with("tags", vec!["a", "b"])
    );
}

#[test]
fn test_default_suppress() {
    let err = Schema::builder("Test")
        .field(Field::opt("foo", TypeExpr::INT).default(SUPPRESS))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::Unsupported {
            feature: UnsupportedFeature::SuppressDefault,
            ..
        }
    ));
}

#[test]
fn test_types() {
    let ord = Converter::custom("ord", |raw: &str| {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
            _ => Err(format!("expected a single character, got {raw:?}")),
        }
    });
    let parser = parser_for(vec![
        Field::new("count", TypeExpr::INT),
        Field::new("distance", TypeExpr::FLOAT),
        Field::arg("code_point", TypeExpr::INT).value_type(ord),
        Field::new("datapath", TypeExpr::PATH),
    ]);

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_str().unwrap();
    let rec = parse(&parser, &["42", "6.28", "å", dir]);

    assert_eq!(rec.extract::<i64>("count").unwrap(), 42);
    assert_eq!(rec.extract::<f64>("distance").unwrap(), 6.28);
    assert_eq!(rec.extract::<i64>("code_point").unwrap(), 0xe5);
    assert_eq!(rec.extract::<PathBuf>("datapath").unwrap(), tmp.path());

    assert_eq!(
        parse_err(&parser, &["42", "6.28", "ab", dir]),
        ErrorKind::ValueValidation
    );
}

#[test]
fn test_choices() {
    let parser = parser_for(vec![
        Field::arg("move", TypeExpr::STR).choices(["rock", "paper", "scissors"]),
    ]);
    assert_eq!(parse(&parser, &["rock"]), record().with("move", "rock"));
    assert_eq!(parse_err(&parser, &["fire"]), ErrorKind::InvalidValue);
}

#[test]
fn test_choices_int() {
    let parser = parser_for(vec![Field::arg("door", TypeExpr::INT).choices(1..4)]);
    assert_eq!(parse(&parser, &["3"]), record().with("door", 3));
    assert_eq!(parse_err(&parser, &["4"]), ErrorKind::InvalidValue);
}

#[test]
fn test_required() {
    let parser = parser_for(vec![Field::opt("foo", TypeExpr::STR)]);
    assert_eq!(parse(&parser, &["--foo", "BAR"]), record().with("foo", "BAR"));
    assert_eq!(parse_err(&parser, &[]), ErrorKind::MissingRequiredArgument);
}

#[test]
fn test_dest() {
    let parser = parser_for(vec![
        Field::arg("integers", TypeExpr::list(TypeExpr::INT))
            .metavar("int")
            .nargs(Nargs::OneOrMore)
            .help("Any integer"),
        Field::opt("accumulate", TypeExpr::Any)
            .names(["--sum"])
            .action(Action::StoreConst)
            .constant("sum")
            .default("max")
            .help("sum the integers (default: find the max)"),
    ]);
    assert_eq!(
        parse(&parser, &["2", "3", "4"]),
        record().with("integers", vec![2, 3, 4]).with("accumulate", "max")
    );
    assert_eq!(
        parse(&parser, &["--sum", "2", "3", "4"]),
        record().with("integers", vec![2, 3, 4]).with("accumulate", "sum")
    );
}

#[test]
fn test_option_values() {
    let parser = parser_for(vec![
        Field::opt("x", TypeExpr::BOOL),
        Field::opt("y", TypeExpr::BOOL),
        Field::opt("z", TypeExpr::STR),
    ]);
    assert_eq!(
        parse(&parser, &["-xyzZ"]),
        record().with("x", true).with("y", true).with("z", "Z")
    );
}

#[test]
fn test_invalid_args() {
    let parser = parser_for(vec![
        Field::opt("foo", TypeExpr::INT),
        Field::arg("bar", TypeExpr::optional(TypeExpr::STR)).nargs(Nargs::Optional),
    ]);
    assert_eq!(
        parse_err(&parser, &["--foo", "spam"]),
        ErrorKind::ValueValidation
    );
    assert_eq!(parse_err(&parser, &["--bar"]), ErrorKind::UnknownArgument);
    assert!(parser.try_parse_args_from(["spam", "badger"]).is_err());
}

#[test]
fn test_required_positional_after_optional_is_rejected() {
    let test = schema(vec![
        Field::arg("bar", TypeExpr::optional(TypeExpr::STR)),
        Field::new("baz", TypeExpr::INT),
    ]);
    let err = RecordParser::new("test").with_root(test).unwrap_err();
    assert_eq!(
        err,
        SchemaError::RequiredAfterOptional {
            field: "baz".to_string(),
            after: "bar".to_string(),
        }
    );

    // The reverse order parses.
    let parser = parser_for(vec![
        Field::new("baz", TypeExpr::INT),
        Field::arg("bar", TypeExpr::optional(TypeExpr::STR)),
    ]);
    assert_eq!(
        parse(&parser, &["1", "x"]),
        record().with("baz", 1).with("bar", "x")
    );
}

#[test]
fn test_positional_after_multi_valued_is_rejected() {
    let test = schema(vec![
        Field::arg("pair", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::Exactly(2)),
        Field::new("dest", TypeExpr::STR),
    ]);
    let err = RecordParser::new("test").with_root(test).unwrap_err();
    assert_eq!(
        err,
        SchemaError::PositionalAfterMultiValued {
            field: "dest".to_string(),
            after: "pair".to_string(),
        }
    );
}

#[test]
fn test_flag_action_on_positional_is_rejected() {
    let test = schema(vec![Field::new("flag", TypeExpr::BOOL).action(Action::StoreTrue)]);
    let err = RecordParser::new("test").with_root(test).unwrap_err();
    assert_eq!(
        err,
        SchemaError::InvalidPositionalAction {
            field: "flag".to_string(),
            action: Action::StoreTrue,
        }
    );
}

#[test]
fn test_zero_nargs_is_rejected() {
    let test = schema(vec![
        Field::opt("foo", TypeExpr::list(TypeExpr::STR)).nargs(Nargs::Exactly(0)),
    ]);
    let err = RecordParser::new("test").with_root(test).unwrap_err();
    assert_eq!(err, SchemaError::ZeroNargs("foo".to_string()));
}

#[test]
fn test_optional_positional_resolves_to_none() {
    let parser = parser_for(vec![Field::arg("bar", TypeExpr::optional(TypeExpr::STR))]);
    assert_eq!(parse(&parser, &[]), record().with("bar", Value::None));
    assert_eq!(parse(&parser, &["x"]), record().with("bar", "x"));
}

#[test]
fn test_multi_way_union_accepts_any_string() {
    let parser = parser_for(vec![Field::new(
        "value",
        TypeExpr::union([TypeExpr::INT, TypeExpr::STR]),
    )]);
    assert_eq!(parse(&parser, &["12"]), record().with("value", "12"));
}

#[test]
fn test_suppressed_field_keeps_default() {
    let parser = parser_for(vec![
        Field::opt("name", TypeExpr::STR),
        Field::opt("cache", TypeExpr::PATH).default("/tmp/cache").suppress(),
    ]);
    assert_eq!(parser.argument_specs().count(), 1);
    assert_eq!(
        parse(&parser, &["-n", "x"]),
        record().with("name", "x").with("cache", "/tmp/cache")
    );
}

#[test]
fn test_must_be_record() {
    let alias = Declaration::Alias {
        name: "Port".to_string(),
        ty: TypeExpr::INT,
    };
    let err = RecordParser::new("test").with_root(alias.clone()).unwrap_err();
    assert_eq!(err, SchemaError::MustBeRecord("Port".to_string()));

    let mut parser = RecordParser::new("test");
    assert!(parser.add_command("port", alias.clone(), None, None).is_err());
    assert!(parser.add_arguments(alias).is_err());
}

#[test]
fn test_idempotent_compilation() {
    let fields = || {
        vec![
            Field::new("input", TypeExpr::PATH),
            Field::opt("level", TypeExpr::optional(TypeExpr::INT)),
            Field::opt("tags", TypeExpr::list(TypeExpr::STR)).default(Value::List(vec![])),
        ]
    };
    let first = parser_for(fields());
    let second = parser_for(fields());
    assert_eq!(
        first.argument_specs().collect::<Vec<_>>(),
        second.argument_specs().collect::<Vec<_>>()
    );
}

#[test]
fn test_round_trip_keeps_every_declared_key() {
    let test = schema(vec![
        Field::new("input", TypeExpr::PATH),
        Field::opt("level", TypeExpr::optional(TypeExpr::INT)),
        Field::opt("quiet", TypeExpr::BOOL),
    ]);
    let parser = RecordParser::new("test").with_root(test.clone()).unwrap();
    let outcome = parser.try_parse_args_from(["in.txt", "-l", "3"]).unwrap();
    let root = outcome.root().unwrap();

    let keys: Vec<_> = root.fields().keys().map(String::as_str).collect();
    assert_eq!(keys, test.field_names().collect::<Vec<_>>());
    assert_eq!(root.get("level"), Some(&Value::Int(3)));
    assert_eq!(root.get("quiet"), Some(&Value::Bool(false)));
}

#[derive(Debug, PartialEq)]
struct Serve {
    root: PathBuf,
    port: i64,
    verbose: bool,
}

impl FromRecord for Serve {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            root: record.extract("root")?,
            port: record.extract("port")?,
            verbose: record.extract("verbose")?,
        })
    }
}

#[test]
fn test_typed_extraction() {
    let serve = Schema::builder("Serve")
        .field(Field::new("root", TypeExpr::PATH))
        .field(Field::opt("port", TypeExpr::INT).default(8080))
        .field(Field::opt("verbose", TypeExpr::BOOL))
        .build()
        .unwrap();
    let parser = RecordParser::new("serve").with_root(serve).unwrap();
    let outcome = parser.try_parse_args_from(["site", "-v"]).unwrap();
    let typed: Serve = outcome.root().cloned().unwrap().into_typed().unwrap();
    assert_eq!(
        typed,
        Serve {
            root: PathBuf::from("site"),
            port: 8080,
            verbose: true,
        }
    );
}

#[test]
fn test_value_type_override_is_used() {
    let parser = parser_for(vec![
        Field::opt("ratio", TypeExpr::STR).value_type(ScalarType::Float),
    ]);
    assert_eq!(parse(&parser, &["-r", "0.5"]), record().with("ratio", 0.5));
}
