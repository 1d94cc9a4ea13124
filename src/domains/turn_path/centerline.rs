// Centerline parsing - WKT LINESTRING text from the solver

use super::types::LonLat;
use crate::common::{DomainResult, TurnPathError};
use nom::{
    bytes::complete::tag_no_case,
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, opt},
    multi::separated_list1,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};

fn coordinate(input: &str) -> IResult<&str, LonLat> {
    (double, multispace1, double, opt(preceded(multispace1, double)))
        .map(|(lon, _, lat, _z)| LonLat::new(lon, lat))
        .parse(input)
}

fn coordinate_list(input: &str) -> IResult<&str, Vec<LonLat>> {
    separated_list1(delimited(multispace0, char(','), multispace0), coordinate).parse(input)
}

fn linestring(input: &str) -> IResult<&str, Vec<LonLat>> {
    let header = (
        multispace0,
        tag_no_case("LINESTRING"),
        multispace0,
        opt((tag_no_case("Z"), multispace0)),
    );
    let body = delimited((char('('), multispace0), coordinate_list, (multispace0, char(')'), multispace0));
    all_consuming(preceded(header, body)).parse(input)
}

/// Parses a WKT `LINESTRING` into ordered (longitude, latitude) pairs.
///
/// Fails when the text is not a linestring, holds fewer than two points,
/// or contains a non-finite coordinate.
pub fn parse_linestring(wkt: &str) -> DomainResult<Vec<LonLat>> {
    let (_, points) = linestring(wkt).map_err(|e| TurnPathError::geometry(format!("unreadable centerline: {}", e)))?;
    if points.len() < 2 {
        return Err(TurnPathError::geometry(format!(
            "centerline has {} point(s), need at least 2",
            points.len()
        )));
    }
    if let Some(bad) = points.iter().position(|p| !p.is_finite()) {
        return Err(TurnPathError::geometry(format!("centerline vertex {} is not finite", bad)));
    }
    Ok(points)
}
