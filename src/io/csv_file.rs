use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::io::{Read, Write};

use super::{IoError, Lookup, Preset, Result};
use crate::{
    emitters::{Conversion, EmitterError, EmitterSet},
    units::XyUnit,
};

/// CSV export columns
pub const CSV_COLUMNS: [&str; 16] = [
    "id", "frame_ix", "x", "y", "z", "phot", "prob", "bg", "x_cr", "y_cr", "z_cr", "phot_cr",
    "bg_cr", "x2", "y2", "z2",
];
// number of columns of the legacy layout: id, frame_ix, x, y, z, phot and prob
const LEGACY_COLUMNS: usize = 7;

/// CSV export options
#[derive(Debug, Clone, Default)]
pub struct CsvOptions {
    xy_unit: Option<XyUnit>,
    xy_unit2: Option<XyUnit>,
    comments: Option<String>,
    plain_header: bool,
}
impl CsvOptions {
    pub fn new() -> Self {
        Default::default()
    }
    /// Unit of the x, y and z columns, the coordinates are written as is if not set
    pub fn xy_unit(self, xy_unit: XyUnit) -> Self {
        Self {
            xy_unit: Some(xy_unit),
            ..self
        }
    }
    /// Unit of the x2, y2 and z2 columns, the columns are NaN if not set
    pub fn xy_unit2(self, xy_unit2: XyUnit) -> Self {
        Self {
            xy_unit2: Some(xy_unit2),
            ..self
        }
    }
    pub fn comments<S: Into<String>>(self, comments: S) -> Self {
        Self {
            comments: Some(comments.into()),
            ..self
        }
    }
    /// Removes the comment marker of the first header line
    pub fn plain_header(self) -> Self {
        Self {
            plain_header: true,
            ..self
        }
    }
}

/// CSV export with a transformation of the emitters
///
/// The transformation is given either explicitly or by a [`Preset`] or a [`Lookup`]
#[derive(Debug, Clone, Default)]
pub struct CsvFormat {
    options: CsvOptions,
    xyz_shift: Option<[f64; 3]>,
    frame_shift: Option<i64>,
    axis: Option<[usize; 3]>,
    lookup: Option<Lookup>,
    preset: Option<String>,
}
impl From<CsvOptions> for CsvFormat {
    fn from(options: CsvOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }
}
impl CsvFormat {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn options(self, options: CsvOptions) -> Self {
        Self { options, ..self }
    }
    pub fn xyz_shift(self, xyz_shift: [f64; 3]) -> Self {
        Self {
            xyz_shift: Some(xyz_shift),
            ..self
        }
    }
    pub fn frame_shift(self, frame_shift: i64) -> Self {
        Self {
            frame_shift: Some(frame_shift),
            ..self
        }
    }
    pub fn axis(self, axis: [usize; 3]) -> Self {
        Self {
            axis: Some(axis),
            ..self
        }
    }
    /// Look-up table replacing all the other settings
    pub fn lookup(self, lookup: Lookup) -> Self {
        Self {
            lookup: Some(lookup),
            ..self
        }
    }
    /// Name of a [`Preset`] replacing all the other settings
    pub fn preset<S: Into<String>>(self, name: S) -> Self {
        Self {
            preset: Some(name.into()),
            ..self
        }
    }
    /// Resolves the look-up table, the options and the conversion to apply
    fn resolve(&self) -> Result<(CsvOptions, Conversion)> {
        let lookup = match (&self.lookup, &self.preset) {
            (Some(_), Some(_)) => {
                return Err(EmitterError::ConflictingArguments(
                    "a look-up table and a preset cannot be specified at the same time",
                )
                .into())
            }
            (Some(lookup), None) => Some(lookup.clone()),
            (None, Some(name)) => Some(Preset::new(name)?.lookup()),
            (None, None) => None,
        };
        if lookup.is_some() && (self.xyz_shift.is_some() || self.axis.is_some()) {
            return Err(EmitterError::ConflictingArguments(
                "shift and axis cannot be specified with a look-up table or a preset",
            )
            .into());
        }
        Ok(match lookup {
            Some(lookup) => {
                let mut options = CsvOptions {
                    xy_unit: lookup.xy_unit,
                    xy_unit2: lookup.xy_unit2,
                    comments: lookup.comments,
                    plain_header: lookup.plain_header,
                };
                if options.comments.is_none() {
                    options.comments = self.options.comments.clone();
                }
                let conversion = Conversion::new()
                    .shift(lookup.xyz_shift)
                    .frame_shift(lookup.frame_shift)
                    .axis(lookup.axis);
                (options, conversion)
            }
            None => {
                let mut conversion = Conversion::new();
                if let Some(shift) = self.xyz_shift {
                    conversion = conversion.shift(shift);
                }
                if let Some(frame_shift) = self.frame_shift {
                    conversion = conversion.frame_shift(frame_shift);
                }
                if let Some(axis) = self.axis {
                    conversion = conversion.axis(axis);
                }
                (self.options.clone(), conversion)
            }
        })
    }
}

/// A CSV table and the options to write it with
pub(super) struct CsvExport {
    options: CsvOptions,
    table: Vec<[f64; 16]>,
}
impl CsvExport {
    pub(super) fn write<W: Write>(self, writer: &mut W) -> Result<Vec<[f64; 16]>> {
        let Self { options, table } = self;
        let mut header = vec![
            CSV_COLUMNS.join(", "),
            "This is an export from smlm-emitters.".to_string(),
            format!("Total number of emitters: {}", table.len()),
        ];
        if let Some(comments) = &options.comments {
            header.push(format!("Comment during export: {}", comments));
        }
        for (k, line) in header.iter().flat_map(|line| line.lines()).enumerate() {
            if k == 0 && options.plain_header {
                writeln!(writer, "{}", line)?;
            } else {
                writeln!(writer, "# {}", line)?;
            }
        }

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
        for row in &table {
            wtr.write_record(row.iter().map(|value| format!("{:.18e}", value)))?;
        }
        wtr.flush()?;
        Ok(table)
    }
}

/// Parses an integral column value
fn integral(name: &'static str, value: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    if value.is_finite() && value.fract() == 0f64 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(IoError::NonIntegral(name, value))
    }
}

impl EmitterSet {
    /// Returns the coordinates in `unit` or as is if `unit` is `None`
    fn xyz_or_raw(&self, unit: Option<XyUnit>) -> Result<Vec<[f64; 3]>> {
        match unit {
            None => Ok(self.xyz().to_vec()),
            Some(unit) => Ok(self
                .xyz_in(unit)?
                .ok_or(EmitterError::MissingUnit)?
                .into_owned()),
        }
    }
    /// Returns the table of the CSV columns, one row per emitter
    pub fn csv_table(
        &self,
        xy_unit: Option<XyUnit>,
        xy_unit2: Option<XyUnit>,
    ) -> Result<Vec<[f64; 16]>> {
        let xyz = self.xyz_or_raw(xy_unit)?;
        let xyz2 = match xy_unit2 {
            Some(_) => self.xyz_or_raw(xy_unit2)?,
            None => vec![[f64::NAN; 3]; self.len()],
        };
        Ok((0..self.len())
            .map(|i| {
                let [x, y, z] = xyz[i];
                let [x_cr, y_cr, z_cr] = self.xyz_cr()[i];
                let [x2, y2, z2] = xyz2[i];
                [
                    self.id()[i] as f64,
                    self.frame_ix()[i] as f64,
                    x,
                    y,
                    z,
                    self.phot()[i],
                    self.prob()[i],
                    self.bg()[i],
                    x_cr,
                    y_cr,
                    z_cr,
                    self.phot_cr()[i],
                    self.bg_cr()[i],
                    x2,
                    y2,
                    z2,
                ]
            })
            .collect())
    }
    /// Builds the CSV table of the set without writing anything
    fn csv_export(&self, options: CsvOptions) -> Result<CsvExport> {
        let table = self.csv_table(options.xy_unit, options.xy_unit2)?;
        Ok(CsvExport { options, table })
    }
    /// Transforms the set and builds its CSV table without writing anything
    ///
    /// Conflicting settings, unknown presets and failed unit conversions are all
    /// reported at this stage
    pub(super) fn csv_format_export(&self, format: &CsvFormat) -> Result<CsvExport> {
        let (options, conversion) = format.resolve()?;
        self.convert_em(&conversion)?.csv_export(options)
    }
    /// Exports the set as CSV
    ///
    /// The header lines start with `#`, except the first one if `plain_header` is set.
    /// Returns the table that has been written.
    pub fn write_csv<W: Write>(
        &self,
        writer: &mut W,
        options: &CsvOptions,
    ) -> Result<Vec<[f64; 16]>> {
        self.csv_export(options.clone())?.write(writer)
    }
    /// Transforms the set and exports it as CSV
    ///
    /// Conflicting settings are rejected before anything is written
    pub fn write_csv_format<W: Write>(
        &self,
        writer: &mut W,
        format: &CsvFormat,
    ) -> Result<Vec<[f64; 16]>> {
        self.csv_format_export(format)?.write(writer)
    }
    /// Imports a set from CSV
    ///
    /// Both the 7 columns legacy layout and the 16 columns layout are supported.
    /// The coordinates unit is unknown.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        log::warn!("CSV is not the proper way to save and store emitter sets.");
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut table: Vec<Vec<f64>> = vec![];
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            if row == 0 && record.get(0) == Some(CSV_COLUMNS[0]) {
                continue;
            }
            let values = record
                .iter()
                .enumerate()
                .map(|(column, value)| {
                    value.parse::<f64>().map_err(|_| IoError::Parse {
                        row,
                        column,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            match (values.len(), table.first().map(|first| first.len())) {
                (n, Some(width)) if n != width => return Err(IoError::BadLayout(n)),
                (n, _) if n != LEGACY_COLUMNS && n != CSV_COLUMNS.len() => {
                    return Err(IoError::BadLayout(n))
                }
                _ => table.push(values),
            }
        }

        let column = |k: usize| -> Vec<f64> { table.iter().map(|row| row[k]).collect() };
        let xyz: Vec<[f64; 3]> = table.iter().map(|row| [row[2], row[3], row[4]]).collect();
        let id = column(0)
            .into_iter()
            .map(|id| integral("id", id))
            .collect::<Result<Vec<_>>>()?;
        let frame_ix = column(1)
            .into_iter()
            .map(|frame| integral("frame_ix", frame))
            .collect::<Result<Vec<_>>>()?;
        let mut builder = EmitterSet::builder(xyz, column(5), frame_ix)
            .id(id)
            .prob(column(6));
        if table.first().is_some_and(|row| row.len() == CSV_COLUMNS.len()) {
            builder = builder
                .bg(column(7))
                .xyz_cr(table.iter().map(|row| [row[8], row[9], row[10]]).collect())
                .phot_cr(column(11))
                .bg_cr(column(12));
        }
        Ok(builder.build()?)
    }
}
