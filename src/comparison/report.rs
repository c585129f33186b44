// Comparison report: text blocks for `summaryTests<names>.csv` and a JSON form

use super::multiple::SignRankBlock;
use super::pairwise::PairwiseComparison;
use crate::collator::Metric;
use crate::table::format_decimal;
use serde::Serialize;
use std::fmt::Write as _;

/// All pairwise verdicts for one statistic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticComparison {
    pub statistic: Metric,
    pub pairs: Vec<PairwiseComparison>,
    pub sign_rank: Option<SignRankBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub classifiers: Vec<String>,
    pub statistics: Vec<StatisticComparison>,
}

fn optional(v: Option<f64>) -> String {
    v.map(format_decimal).unwrap_or_default()
}

fn write_matrix(out: &mut String, title: &str, classifiers: &[String], cells: &[Vec<Option<f64>>]) {
    let _ = writeln!(out, "{} ", title);
    out.push(' ');
    for c in classifiers {
        out.push(',');
        out.push_str(c);
    }
    out.push('\n');
    for (name, row) in classifiers.iter().zip(cells) {
        out.push_str(name);
        for cell in row {
            out.push(',');
            out.push_str(&optional(*cell));
        }
        out.push('\n');
    }
}

impl StatisticComparison {
    fn write_text(&self, out: &mut String) {
        let stat = self.statistic;
        let _ = writeln!(out, "**************{}********************", stat);
        for pair in &self.pairs {
            let prefix = format!("{},{},{}", stat, pair.first, pair.second);
            let _ = writeln!(
                out,
                "{},WIN/DRAW/LOSE,{},{},{}, p =,{}",
                prefix,
                pair.wins,
                pair.draws,
                pair.losses,
                format_decimal(pair.sign_test_p)
            );
            let _ = writeln!(
                out,
                "{},SIGWIN/SIGLOSS,{},{}",
                prefix, pair.sig_wins, pair.sig_losses
            );
            let _ = writeln!(
                out,
                "{},COUNT,{},MeanDiff,{},StDevDiff,{}",
                prefix,
                pair.count,
                optional(pair.mean_diff),
                optional(pair.std_diff)
            );
        }
        if let Some(block) = &self.sign_rank {
            write_matrix(out, "SIGN RANK TEST", &block.classifiers, &block.sign_rank);
        }
    }
}

impl ComparisonReport {
    /// Text layout of `summaryTests<names>.csv`
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.classifiers.concat());
        for statistic in &self.statistics {
            statistic.write_text(&mut out);
        }
        out
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn statistic(&self, metric: Metric) -> Option<&StatisticComparison> {
        self.statistics.iter().find(|s| s.statistic == metric)
    }
}
