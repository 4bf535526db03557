//! # Brushograph G-code
//!
//! G-code handling for the brush-painting machine:
//! - Typed instruction model for the G0/G1 dialect the machine accepts
//! - Line parser with `;Layer <Name>` marker recognition
//! - Formatter pipeline (Z separation, Z simplification, feed rate elision)
//! - Raster S-word to Z-lift converter

pub mod command;
pub mod formatter;
pub mod parser;
pub mod raster;

pub use command::{format_number, Instruction, InstructionKind, Motion, Word};
pub use formatter::{
    EmptyMoveProcessor, FeedRateProcessor, Formatter, InstructionProcessor, ProcessorHandle,
    ZAxisProcessor,
};
pub use parser::{parse_line, parse_program, parse_sequence, ParsedLine, Program};
pub use raster::{detect_scan_feed, RasterConversion, RasterZConverter, RasterZOptions};
