//! Parser and formatter tests on realistic painting programs

use brushograph_core::{GcodeError, PartialPosition};
use brushograph_gcode::{
    parse_program, parse_sequence, Formatter, Instruction, InstructionKind,
};

const PAINTING: &str = "\
G21
G90
;Layer Green
G0 X10 Y10
G1 Z0 F500
G1 X20 Y10 F1000
G1 X20 Y20
G0 Z5
;Layer C03 (outline)
G0 X30 Y30 Z5
G1 X31.5 Y30 Z0 S800 F800 ; first stroke
M2
";

#[test]
fn test_classifies_every_line() {
    let kinds: Vec<_> = parse_program(PAINTING)
        .map(|line| line.unwrap().instruction.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            InstructionKind::Other,
            InstructionKind::Other,
            InstructionKind::LayerMarker,
            InstructionKind::RapidMove,
            InstructionKind::DrawMove,
            InstructionKind::DrawMove,
            InstructionKind::DrawMove,
            InstructionKind::RapidMove,
            InstructionKind::LayerMarker,
            InstructionKind::RapidMove,
            InstructionKind::DrawMove,
            InstructionKind::Other,
        ]
    );
}

#[test]
fn test_formats_painting_program() {
    let formatted = Formatter::default().format_str(PAINTING).unwrap();
    assert_eq!(
        formatted,
        "\
G21
G90
;Layer Green
G0 X10 Y10
G1 Z0 F500
G1 X20 Y10 F1000
G1 X20 Y20
G0 Z5
;Layer C03 (outline)
G0 X30 Y30
G1 X31.5 Y30 S800 F800 ; first stroke
G1 Z0
M2
"
    );
}

#[test]
fn test_format_reports_parse_error_line() {
    let err = Formatter::default()
        .format_str("G0 X0\n;Layer Red\nG1 X2 #3")
        .unwrap_err();
    assert_eq!(err.line_number(), 3);
    assert!(matches!(err, GcodeError::InvalidSyntax { .. }));
}

#[test]
fn test_parse_sequence_for_configured_blocks() {
    let block = parse_sequence(["G0 Z10 F500", "G1 X5 Y5 F1200", "G1 Z0 F1000"]).unwrap();
    assert_eq!(block.len(), 3);
    assert_eq!(block[1].target(), Some(&PartialPosition::xy(5.0, 5.0)));

    let err = parse_sequence(vec!["G0 Z10".to_string(), "G1 X".to_string()]).unwrap_err();
    assert_eq!(err.line_number(), 2);
}

#[test]
fn test_rendered_program_reparses_to_same_instructions() {
    let instructions: Vec<Instruction> = parse_program(PAINTING)
        .map(|line| line.unwrap().instruction)
        .collect();
    let rendered = Formatter::render(&instructions);
    let reparsed: Vec<Instruction> = parse_program(&rendered)
        .map(|line| line.unwrap().instruction)
        .collect();
    assert_eq!(instructions, reparsed);
}
