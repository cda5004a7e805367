use super::{
    Label, Session,
    instruction::{Setting, ShapeDecl},
};
use crate::datatypes::Point;
use winnow::{
    Result as WResult,
    ascii::{alphanumeric1, digit1, line_ending, multispace0, space0, space1},
    combinator::{alt, delimited, eof, opt, preceded, separated},
    prelude::*,
};

impl Session {
    pub(super) fn parse(i: &mut &str) -> WResult<Self> {
        multispace0.parse_next(i)?;
        ignore_ws(i);
        shapes_header.parse_next(i)?;
        let shapes: Vec<_> = separated(1.., ShapeDecl::parse, line_ending).parse_next(i)?;
        multispace0.parse_next(i)?;
        let settings = opt(preceded(
            (ws, settings_header),
            separated(0.., Setting::parse, line_ending),
        ))
        .parse_next(i)?
        .unwrap_or_default();
        multispace0.parse_next(i)?;
        eof.parse_next(i)?;
        Ok(Self { shapes, settings })
    }
}

impl ShapeDecl {
    // a is A at (0, 0)
    fn parse(i: &mut &str) -> WResult<Self> {
        ignore_ws(i);
        let label = Label::parse(i)?;
        space1.parse_next(i)?;
        let _ = "is".parse_next(i)?;
        space1.parse_next(i)?;
        let glyph = Label::parse(i)?;
        space1.parse_next(i)?;
        let _ = "at".parse_next(i)?;
        ignore_ws(i);
        let at = point(i)?;
        ignore_ws(i);
        Ok(Self { label, glyph, at })
    }
}

impl Setting {
    fn parse(i: &mut &str) -> WResult<Self> {
        ignore_ws(i);
        let setting = alt((
            preceded(("gap", equals), parse_number).map(Setting::Gap),
            preceded(("units_per_world", equals), parse_number).map(Setting::UnitsPerWorld),
            preceded(("flip_y", equals), boolean).map(Setting::FlipY),
            preceded(("container", equals), Label::parse).map(Setting::Container),
        ))
        .parse_next(i)?;
        ignore_ws(i);
        Ok(setting)
    }
}

fn shapes_header(i: &mut &str) -> WResult<()> {
    ('#', ws, "shapes", ws, line_ending).map(|_| ()).parse_next(i)
}
fn settings_header(i: &mut &str) -> WResult<()> {
    ('#', ws, "settings", ws, line_ending).map(|_| ()).parse_next(i)
}

fn equals(i: &mut &str) -> WResult<()> {
    delimited(space0, '=', space0).map(|_| ()).parse_next(i)
}

fn boolean(i: &mut &str) -> WResult<bool> {
    alt(("true".value(true), "false".value(false))).parse_next(i)
}

fn ws(i: &mut &str) -> WResult<()> {
    space0.parse_next(i).map(|_| ())
}

fn ignore_ws(i: &mut &str) {
    let _ = ws.parse_next(i);
}

impl Label {
    fn parse(i: &mut &str) -> WResult<Label> {
        alphanumeric1
            .map(|s: &str| Label(s.to_owned()))
            .parse_next(i)
    }
}

fn point(input: &mut &str) -> WResult<Point> {
    delimited(
        ('(', space0),
        (parse_number, space0, ',', space0, parse_number).map(|(x, _, _comma, _, y)| Point { x, y }),
        (space0, ')'),
    )
    .parse_next(input)
}

/// `count` line, then `x y` lines. Checking the count is left to the caller,
/// so a mismatch can be reported as such rather than as a syntax error.
pub(super) fn polygon_record(i: &mut &str) -> WResult<(usize, Vec<Point>)> {
    multispace0.parse_next(i)?;
    let count = digit1
        .verify_map(|s: &str| s.parse::<usize>().ok())
        .parse_next(i)?;
    ws.parse_next(i)?;
    let vertices: Vec<Point> = opt(preceded(
        line_ending,
        separated(0.., vertex_line, line_ending),
    ))
    .parse_next(i)?
    .unwrap_or_default();
    multispace0.parse_next(i)?;
    eof.parse_next(i)?;
    Ok((count, vertices))
}

fn vertex_line(i: &mut &str) -> WResult<Point> {
    (space0, parse_number, space1, parse_number, space0)
        .map(|(_, x, _, y, _)| Point { x, y })
        .parse_next(i)
}

fn parse_number(i: &mut &str) -> WResult<f64> {
    fn myint(input: &mut &str) -> WResult<f64> {
        digit1
            .verify_map(|s: &str| s.parse::<f64>().ok())
            .parse_next(input)
    }

    fn myfloat(i: &mut &str) -> WResult<f64> {
        winnow::ascii::float.parse_next(i)
    }
    alt((myfloat, myint)).parse_next(i)
}
