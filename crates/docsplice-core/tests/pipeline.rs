use docsplice::*;
use std::fs;
use tempfile::TempDir;

fn proposal(name: &str, kind: DeclarationKind, summary: &str) -> ProposedComment {
    ProposedComment {
        name: name.to_string(),
        kind,
        signature: None,
        owner: None,
        summary: summary.to_string(),
        params: Vec::new(),
        returns: None,
        throws: false,
    }
}

fn hint(params: &[(&str, Option<&str>)]) -> Option<SignatureHint> {
    Some(SignatureHint {
        params: params
            .iter()
            .map(|(name, ty)| HintParam {
                name: name.to_string(),
                type_hint: ty.map(str::to_string),
            })
            .collect(),
    })
}

fn run(source: &str, proposals: &[ProposedComment]) -> FileOutcome {
    process_source(source, proposals, &PipelineOptions::default()).unwrap()
}

const SHAPES: &str = "\
import { Point } from './point';

export interface Shape {
  area(): number;
  readonly name: string;
}

export class Circle implements Shape {
  readonly name = 'circle';
  private radius: number;

  constructor(radius: number) {
    this.radius = radius;
  }

  area(): number {
    return Math.PI * this.radius ** 2;
  }

  set size(value: number) {
    this.radius = value;
  }
}

export function scale(shape: Shape, factor: number): Shape;
export function scale(point: Point, factor: number): Point;
export function scale(target: any, factor: number): any {
  return target;
}

export type Area = (shape: Shape) => number;

const DEFAULT_FACTOR = 2;
";

fn shapes_batch() -> Vec<ProposedComment> {
    let mut circle = proposal("Circle", DeclarationKind::ClassDeclaration, "A circle.");
    circle.returns = Some("ignored for classes".to_string());

    let mut ctor = proposal("constructor", DeclarationKind::MethodMember, "Creates a circle.");
    ctor.params.push(ParamDoc {
        name: "radius".to_string(),
        description: "the radius".to_string(),
    });

    let mut area = proposal("area", DeclarationKind::MethodMember, "Computes the area.");
    area.owner = Some("Circle".to_string());
    area.returns = Some("The area.".to_string());

    let mut scale = proposal("scale", DeclarationKind::Function, "Scales a point.");
    scale.signature = hint(&[("point", Some("Point")), ("factor", None)]);

    vec![
        circle,
        ctor,
        area,
        scale,
        proposal("Shape", DeclarationKind::InterfaceDeclaration, "Anything with an area."),
        proposal("radius", DeclarationKind::PropertyMember, "Radius in metres."),
        proposal("Area", DeclarationKind::TypeAlias, "Area function."),
        proposal("DEFAULT_FACTOR", DeclarationKind::VariableDeclaration, "Default scale."),
        proposal("size", DeclarationKind::MethodMember, "Sets the size."),
    ]
}

#[test]
fn add_scenario_exact_output() {
    let source = "export function add(a: number, b: number) { return a + b; }\n";
    let mut add = proposal("add", DeclarationKind::Function, "Adds two numbers.");
    add.params = vec![
        ParamDoc {
            name: "a".to_string(),
            description: "first addend".to_string(),
        },
        ParamDoc {
            name: "b".to_string(),
            description: "second addend".to_string(),
        },
    ];
    add.returns = Some("The sum.".to_string());

    let outcome = run(source, &[add]);
    assert!(outcome.changed);
    assert_eq!(
        outcome.text,
        "/**\n * Adds two numbers.\n *\n * @param a first addend\n * @param b second addend\n * @returns The sum.\n */\nexport function add(a: number, b: number) { return a + b; }\n"
    );
    assert_eq!(outcome.resolved.len(), 1);
    assert!(outcome.unresolved.is_empty());
}

#[test]
fn shapes_file_is_fully_documented() {
    let outcome = run(SHAPES, &shapes_batch());
    assert!(outcome.unresolved.is_empty(), "{:?}", outcome.unresolved);
    assert_eq!(outcome.resolved.len(), 9);

    let text = &outcome.text;
    assert!(text.contains("  /**\n   * Creates a circle.\n   *\n   * @param radius the radius\n   */\n  constructor(radius: number) {"));
    assert!(text.contains("  /** Radius in metres. */\n  private radius: number;"));
    assert!(text.contains("/**\n * A circle.\n */\nexport class Circle"));
    assert!(text.contains("   * @returns The area.\n   */\n  area(): number {"));
    assert!(text.contains("/** Default scale. */\nconst DEFAULT_FACTOR = 2;"));
    // The hint picks the second overload.
    assert!(text.contains(" * Scales a point.\n */\nexport function scale(point: Point"));
}

#[test]
fn rerun_is_idempotent() {
    let batch = shapes_batch();
    let first = run(SHAPES, &batch);
    let second = run(&first.text, &batch);
    assert!(!second.changed);
    assert_eq!(second.text, first.text);
    assert!(second.resolved.is_empty());
    assert_eq!(second.skipped_documented.len(), 9);
}

#[test]
fn documented_file_is_byte_identical() {
    let source = "\
/** Adds. */
export function add(a: number, b: number) { return a + b; }

class Box {
  /**
   * The content.
   */
  value = 1;
}
";
    let outcome = run(
        source,
        &[
            proposal("add", DeclarationKind::Function, "Something else."),
            proposal("Box", DeclarationKind::ClassDeclaration, "A box."),
            proposal("value", DeclarationKind::PropertyMember, "Another text."),
        ],
    );
    // Only the undocumented class is touched.
    assert_eq!(outcome.resolved.len(), 1);

    let documented = outcome.text;
    let again = run(
        &documented,
        &[
            proposal("add", DeclarationKind::Function, "Something else."),
            proposal("Box", DeclarationKind::ClassDeclaration, "A box."),
            proposal("value", DeclarationKind::PropertyMember, "Another text."),
        ],
    );
    assert_eq!(again.text.as_bytes(), documented.as_bytes());
    assert_eq!(again.skipped_documented.len(), 3);
}

#[test]
fn offsets_stay_valid_after_many_insertions() {
    let outcome = run(SHAPES, &shapes_batch());
    let before = index(SHAPES).unwrap();
    let after = index(&outcome.text).unwrap();
    assert_eq!(before.len(), after.len());

    let batch = shapes_batch();
    let text = &outcome.text;
    let mut newly_documented = 0;
    for (old, new) in before.records.iter().zip(&after.records) {
        assert_eq!(old.key, new.key);
        if old.has_doc {
            assert!(new.has_doc, "{} lost its comment", new.key);
        } else if new.has_doc {
            newly_documented += 1;
            assert!(outcome.resolved.contains(&new.key), "{}", new.key);
            // The anchor now sits on the inserted block, and that block is
            // the one proposed for this declaration.
            assert!(text[new.anchor..].starts_with("/**"), "{}", new.key);
            let end = new.anchor + text[new.anchor..].find("*/").unwrap() + 2;
            let block = &text[new.anchor..end];
            let proposed = batch
                .iter()
                .find(|p| p.name == new.key.name && p.kind == new.key.kind)
                .unwrap();
            assert!(block.contains(&proposed.summary), "{}: {}", new.key, block);
            let between = &text[end..new.decl_start];
            assert!(between.starts_with('\n'), "{}", new.key);
            assert!(!between.contains("/*"), "{} is not below its comment", new.key);
        }
    }
    assert_eq!(newly_documented, outcome.resolved.len());
}

#[test]
fn overload_choice_is_deterministic() {
    let source = "\
function parse(input: string): number;
function parse(input: string, radix: number): number;
function parse(input: any, radix?: number): number {
  return 0;
}
";
    let mut with_radix = proposal("parse", DeclarationKind::Function, "Parses with a radix.");
    with_radix.signature = hint(&[("input", Some("string")), ("radix", Some("number"))]);

    for _ in 0..5 {
        let outcome = run(source, std::slice::from_ref(&with_radix));
        let at = outcome.text.find("/**").unwrap();
        let line = outcome.text[..at].lines().count();
        assert_eq!(line, 1, "comment should precede the second overload");
    }

    // Without a hint every overload ties; the first one wins.
    let plain = proposal("parse", DeclarationKind::Function, "Parses.");
    let outcome = run(source, &[plain]);
    assert!(outcome.text.starts_with("/**\n * Parses.\n */\nfunction parse(input: string): number;"));
}

#[test]
fn empty_summary_is_rejected() {
    let source = "export function add(a: number, b: number) { return a + b; }\n";
    let outcome = run(source, &[proposal("add", DeclarationKind::Function, "  ")]);
    assert!(!outcome.changed);
    assert_eq!(outcome.text, source);
    assert!(matches!(
        outcome.unresolved[0].reason,
        UnresolvedReason::Rejected {
            error: RenderError::EmptySummary
        }
    ));
}

#[test]
fn unresolved_reasons_are_reported() {
    let source = "class A {\n  run() {}\n}\nclass B {\n  stop() {}\n}\n";
    let mut wrong_owner = proposal("run", DeclarationKind::MethodMember, "Runs.");
    wrong_owner.owner = Some("B".to_string());
    let outcome = run(
        source,
        &[
            wrong_owner,
            proposal("missing", DeclarationKind::Function, "Gone."),
            proposal("run", DeclarationKind::PropertyMember, "Wrong kind."),
        ],
    );
    let reasons: Vec<&UnresolvedReason> = outcome.unresolved.iter().map(|u| &u.reason).collect();
    assert_eq!(
        reasons,
        vec![
            &UnresolvedReason::OwnerMismatch,
            &UnresolvedReason::NotFound,
            &UnresolvedReason::NotFound
        ]
    );
    assert!(!outcome.changed);
}

#[test]
fn crlf_file_keeps_line_endings() {
    let source = "export class A {\r\n  run(): void {}\r\n}\r\n";
    let outcome = run(
        source,
        &[
            proposal("A", DeclarationKind::ClassDeclaration, "An A."),
            proposal("run", DeclarationKind::MethodMember, "Runs."),
        ],
    );
    assert_eq!(
        outcome.text,
        "/**\r\n * An A.\r\n */\r\nexport class A {\r\n  /**\r\n   * Runs.\r\n   */\r\n  run(): void {}\r\n}\r\n"
    );
}

#[test]
fn decorated_class_gets_comment_above_decorator() {
    let source = "@Component({})\nexport class View {}\n";
    let outcome = run(source, &[proposal("View", DeclarationKind::ClassDeclaration, "A view.")]);
    assert_eq!(outcome.text, "/**\n * A view.\n */\n@Component({})\nexport class View {}\n");
}

#[test]
fn doc_after_decorator_is_not_duplicated() {
    let source = "class A {\n  @Input()\n  /** Existing. */\n  name: string;\n}\n";
    let outcome = run(
        source,
        &[proposal("name", DeclarationKind::PropertyMember, "A second doc.")],
    );
    assert!(!outcome.changed);
    assert_eq!(outcome.text, source);
    assert_eq!(outcome.skipped_documented.len(), 1);
}

#[test]
fn destructured_parameter_has_no_param_tag() {
    let source = "export function draw({ x, y }: Point, scale: number) {}\n";
    let mut draw = proposal("draw", DeclarationKind::Function, "Draws a point.");
    draw.params = vec![
        ParamDoc {
            name: "{ x, y }".to_string(),
            description: "the point".to_string(),
        },
        ParamDoc {
            name: "scale".to_string(),
            description: "zoom factor".to_string(),
        },
    ];
    let outcome = run(source, &[draw]);
    assert_eq!(
        outcome.text,
        "/**\n * Draws a point.\n *\n * @param scale zoom factor\n */\nexport function draw({ x, y }: Point, scale: number) {}\n"
    );
}

#[test]
fn failing_file_does_not_stop_others() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("good.ts");
    let bad = dir.path().join("bad.ts");
    let missing = dir.path().join("missing.ts");
    fs::write(&good, "export function add(a: number, b: number) { return a + b; }\n").unwrap();
    fs::write(&bad, "export function (\n").unwrap();

    let jobs = vec![
        FileJob {
            path: bad.clone(),
            proposals: vec![proposal("add", DeclarationKind::Function, "Adds.")],
        },
        FileJob {
            path: good.clone(),
            proposals: vec![proposal("add", DeclarationKind::Function, "Adds.")],
        },
        FileJob {
            path: missing,
            proposals: Vec::new(),
        },
    ];
    let results = process_files(&jobs, &PipelineOptions::default(), 2).unwrap();
    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], Err(FileError::Parse { .. })));
    assert!(matches!(results[2], Err(FileError::Read { .. })));

    let report = results[1].as_ref().unwrap();
    assert!(report.written);
    assert_eq!(
        fs::read_to_string(&good).unwrap(),
        "/**\n * Adds.\n */\nexport function add(a: number, b: number) { return a + b; }\n"
    );
    assert_eq!(fs::read_to_string(&bad).unwrap(), "export function (\n");
}

#[test]
fn batch_file_drives_processing() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    let file = dir.path().join("src/math.ts");
    fs::write(&file, "export const PI = 3.14;\n").unwrap();
    let batch_path = dir.path().join("docs.json");
    fs::write(
        &batch_path,
        r#"{"files": {"src/math.ts": [{"name": "PI", "kind": "const", "summary": "Pi, roughly."}]}}"#,
    )
    .unwrap();

    let batch = ProposalBatch::load(&batch_path).unwrap();
    let jobs: Vec<FileJob> = batch
        .paths()
        .into_iter()
        .map(|path| FileJob::from_source(path, &batch))
        .collect();
    assert_eq!(jobs.len(), 1);
    let results = process_files(&jobs, &PipelineOptions::default(), 1).unwrap();
    assert!(results[0].as_ref().unwrap().written);
    assert_eq!(
        fs::read_to_string(&file).unwrap(),
        "/** Pi, roughly. */\nexport const PI = 3.14;\n"
    );
}
