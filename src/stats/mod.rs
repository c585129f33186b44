// Statistics for fold aggregation and classifier comparison

mod descriptive;
mod hypothesis;

pub use descriptive::{average_ranks, mean, population_std_dev, summarise, Summary};
pub use hypothesis::{
    one_sample_tests, paired_lower_tail_p, sign_test_p, OneSampleTests, TestOutcome,
};
