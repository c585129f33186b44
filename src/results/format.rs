// Per-fold result file layouts
//
// Two historical layouts exist. They differ only in where the build time
// lives:
// - Legacy: line 2 starts with `BuildTime,<t>` followed by the parameter info
// - Current: line 2 is parameter info only, build time is line 3 field 1
//
// Each layout has its own extraction function so that a third layout is an
// additional variant rather than another branch deep inside the parser.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of a per-fold result file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResultFileFormat {
    /// Build time is field 1 of line 2
    #[default]
    Legacy,
    /// Build time is field 1 of line 3
    Current,
}

/// First line of a result file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultHeader {
    pub problem: String,
    pub classifier: String,
    pub split: String,
    pub fold: Option<usize>,
}

/// One test instance: true class, predicted class and optional distribution
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub true_class: usize,
    pub predicted_class: usize,
    pub distribution: Option<Vec<f64>>,
}

impl Prediction {
    pub fn is_correct(&self) -> bool {
        self.true_class == self.predicted_class
    }
}

/// A parsed per-fold result file. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    pub header: ResultHeader,
    /// Accuracy as written on line 3
    pub accuracy: f64,
    pub build_time: Option<f64>,
    pub test_time: Option<f64>,
    pub memory: Option<f64>,
    pub train_cv_accuracy: Option<f64>,
    /// Line 2 fields after the layout-specific prefix was removed
    pub parameter_fields: Vec<String>,
    pub predictions: Vec<Prediction>,
}

/// Structural parse failure, carrying the raw line 2 fields for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub reason: String,
    pub fields: Vec<String>,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line 2: {})", self.reason, self.fields.join(","))
    }
}

/// Values pulled out of line 2 by a specific layout
#[derive(Debug, Default)]
struct ParameterLine {
    build_time: Option<f64>,
    rest: Vec<String>,
}

/// Values pulled out of line 3 by a specific layout
#[derive(Debug, Default)]
struct SummaryLine {
    accuracy: f64,
    build_time: Option<f64>,
    test_time: Option<f64>,
    memory: Option<f64>,
}

impl ResultFileFormat {
    fn parse_parameter_line(self, fields: &[String]) -> Result<ParameterLine, String> {
        match self {
            ResultFileFormat::Legacy => legacy_parameter_line(fields),
            ResultFileFormat::Current => Ok(ParameterLine {
                build_time: None,
                rest: fields.to_vec(),
            }),
        }
    }

    fn parse_summary_line(self, fields: &[&str]) -> Result<SummaryLine, String> {
        match self {
            ResultFileFormat::Legacy => legacy_summary_line(fields),
            ResultFileFormat::Current => current_summary_line(fields),
        }
    }

    /// Extract only (accuracy, time) from the first three lines.
    ///
    /// Used by the reference comparison, which tolerates a missing time.
    pub fn accuracy_and_time(self, second: &str, third: &str) -> (Result<f64, String>, Option<f64>) {
        let second: Vec<&str> = second.split(',').map(str::trim).collect();
        let third: Vec<&str> = third.split(',').map(str::trim).collect();
        let time_field = match self {
            ResultFileFormat::Legacy => second.get(1),
            ResultFileFormat::Current => third.get(1),
        };
        let time = time_field.and_then(|s| s.parse::<f64>().ok());
        (parse_number(third[0], "accuracy"), time)
    }
}

impl fmt::Display for ResultFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultFileFormat::Legacy => write!(f, "legacy"),
            ResultFileFormat::Current => write!(f, "current"),
        }
    }
}

fn legacy_parameter_line(fields: &[String]) -> Result<ParameterLine, String> {
    if fields.len() <= 1 {
        return Ok(ParameterLine::default());
    }
    let build_time = parse_number(&fields[1], "build time")?;
    Ok(ParameterLine {
        build_time: Some(build_time),
        rest: fields[2..].to_vec(),
    })
}

fn legacy_summary_line(fields: &[&str]) -> Result<SummaryLine, String> {
    Ok(SummaryLine {
        accuracy: parse_number(fields[0], "accuracy")?,
        memory: optional_number(fields, 4, "memory")?,
        ..SummaryLine::default()
    })
}

fn current_summary_line(fields: &[&str]) -> Result<SummaryLine, String> {
    Ok(SummaryLine {
        accuracy: parse_number(fields[0], "accuracy")?,
        build_time: optional_number(fields, 1, "build time")?,
        test_time: optional_number(fields, 2, "test time")?,
        memory: optional_number(fields, 4, "memory")?,
    })
}

fn parse_number(field: &str, what: &str) -> Result<f64, String> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("cannot parse {} from '{}'", what, field))
}

fn optional_number(fields: &[&str], idx: usize, what: &str) -> Result<Option<f64>, String> {
    match fields.get(idx).map(|s| s.trim()) {
        None | Some("") => Ok(None),
        Some(s) => parse_number(s, what).map(Some),
    }
}

fn parse_class(field: &str) -> Result<usize, String> {
    let value = parse_number(field, "class index")?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(format!("invalid class index '{}'", field));
    }
    Ok(value as usize)
}

fn parse_header(line: &str) -> Result<ResultHeader, String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 2 || parts[0].is_empty() {
        return Err(format!("malformed first line '{}'", line));
    }
    let fold = match parts.get(3) {
        Some(s) if !s.is_empty() => s.parse::<usize>().ok(),
        _ => None,
    };
    Ok(ResultHeader {
        problem: parts[0].to_string(),
        classifier: parts[1].to_string(),
        split: parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
        fold,
    })
}

/// Parse one instance line: `true,pred[,],p0,...,pK-1[,,time[,,description]]`
fn parse_prediction(line: &str) -> Result<Prediction, String> {
    let split: Vec<&str> = line.split(',').map(str::trim).collect();
    if split.len() < 2 {
        return Err(format!("instance line '{}' has fewer than two fields", line));
    }
    let true_class = parse_class(split[0])?;
    let predicted_class = parse_class(split[1])?;

    let mut rest = split[2..].iter().peekable();
    // current layout separates the distribution with an empty field
    if rest.peek().is_some_and(|s| s.is_empty()) {
        rest.next();
    }
    let mut probs = Vec::new();
    for field in rest {
        if field.is_empty() {
            break;
        }
        probs.push(parse_number(field, "probability")?);
    }

    Ok(Prediction {
        true_class,
        predicted_class,
        distribution: if probs.is_empty() { None } else { Some(probs) },
    })
}

impl FoldResult {
    /// Parse the full text of a result file.
    pub fn parse(text: &str, format: ResultFileFormat) -> Result<Self, ParseFailure> {
        let mut lines = text.lines();
        let fail = |reason: String, fields: &[String]| ParseFailure {
            reason,
            fields: fields.to_vec(),
        };

        let first = lines
            .next()
            .ok_or_else(|| fail("missing first line".to_string(), &[]))?;
        let header = parse_header(first).map_err(|r| fail(r, &[]))?;

        let second = lines
            .next()
            .ok_or_else(|| fail("missing parameter line".to_string(), &[]))?;
        let second_fields: Vec<String> = second.split(',').map(|s| s.trim().to_string()).collect();
        let parameter_line = format
            .parse_parameter_line(&second_fields)
            .map_err(|r| fail(r, &second_fields))?;

        let third = lines
            .next()
            .ok_or_else(|| fail("missing accuracy line".to_string(), &second_fields))?;
        let third_fields: Vec<&str> = third.split(',').map(str::trim).collect();
        let summary = format
            .parse_summary_line(&third_fields)
            .map_err(|r| fail(r, &second_fields))?;

        let train_cv_accuracy = match parameter_line.rest.get(1) {
            Some(s) if !s.is_empty() => {
                Some(parse_number(s, "train CV accuracy").map_err(|r| fail(r, &second_fields))?)
            }
            _ => None,
        };

        let mut predictions = Vec::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            predictions.push(parse_prediction(line).map_err(|r| fail(r, &second_fields))?);
        }

        let widths: Vec<usize> = predictions
            .iter()
            .filter_map(|p| p.distribution.as_ref().map(Vec::len))
            .collect();
        if widths.windows(2).any(|w| w[0] != w[1]) {
            return Err(fail(
                "probability distributions have differing numbers of classes".to_string(),
                &second_fields,
            ));
        }

        Ok(FoldResult {
            header,
            accuracy: summary.accuracy,
            build_time: parameter_line.build_time.or(summary.build_time),
            test_time: summary.test_time,
            memory: summary.memory,
            train_cv_accuracy,
            parameter_fields: parameter_line.rest,
            predictions,
        })
    }

    /// Split line 2 into `num_params` parameter values and trailing tuning accuracies.
    ///
    /// Parameters sit at every other field from position 3 (name/value pairs after
    /// the train CV pair). Tuning accuracies start two fields past the last
    /// parameter value read, so the field straight after it is skipped; with no
    /// parameters they start at position 3. Missing parameters come back as `None`.
    pub fn parameters(&self, num_params: usize) -> (Vec<Option<String>>, Vec<String>) {
        let fields = &self.parameter_fields;
        if fields.len() <= 1 {
            return (vec![None; num_params], Vec::new());
        }
        let mut pos = 3;
        let mut values = Vec::with_capacity(num_params);
        for _ in 0..num_params {
            match fields.get(pos) {
                Some(v) => {
                    values.push(Some(v.clone()));
                    pos += 2;
                }
                None => values.push(None),
            }
        }
        let tuning = fields.iter().skip(pos).cloned().collect();
        (values, tuning)
    }

    /// Accuracy recomputed from the instance predictions
    pub fn computed_accuracy(&self) -> Option<f64> {
        if self.predictions.is_empty() {
            return None;
        }
        let correct = self.predictions.iter().filter(|p| p.is_correct()).count();
        Some(correct as f64 / self.predictions.len() as f64)
    }

    /// Instance predictions in the layout used for merged prediction files
    pub fn predictions_to_csv(&self) -> String {
        let mut out = String::new();
        for p in &self.predictions {
            out.push_str(&format!("{},{},", p.true_class, p.predicted_class));
            if let Some(dist) = &p.distribution {
                for d in dist {
                    out.push_str(&format!(",{}", d));
                }
            }
            out.push('\n');
        }
        out
    }
}
