use super::common::direct_pipeline;
use crate::severity::batch::{BatchScorer, RowOutcome};
use crate::severity::label::SeverityLabel;

const EXPORT: &str = "\
id,age,sex,dataset,cp,trestbps,chol,fbs,restecg,thalch,exang,oldpeak,slope,ca,thal,num
1,63,Male,Cleveland,typical angina,145,233,TRUE,lv hypertrophy,150,FALSE,2.3,downsloping,0,fixed defect,0
2,67,Male,Cleveland,asymptomatic,160,286,FALSE,lv hypertrophy,108,TRUE,1.5,flat,3,normal,2
3,54,Male,Hungary,asymptomatic,150,,FALSE,st-t abnormality,134,FALSE,1,,,,4
4,48,Female,Hungary,chest ache,120,200,FALSE,normal,160,FALSE,0,,,,0
5,,Male,Switzerland,asymptomatic,130,0,FALSE,normal,120,TRUE,1,flat,,,3
";

#[test]
fn scores_valid_rows_and_reports_rejections() {
    let pipeline = direct_pipeline();
    let report = BatchScorer::new(&pipeline)
        .score_reader(EXPORT.as_bytes())
        .expect("export parses");

    assert_eq!(report.rows.len(), 5);
    assert_eq!(report.scored, 3);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.predicted_counts.values().sum::<usize>(), 3);

    assert_eq!(report.rows[1].expected, Some(SeverityLabel::MildModerate));
    assert_eq!(report.rows[2].expected, Some(SeverityLabel::SevereCritical));
    assert!(report.rows[2].prediction().is_some());

    match &report.rows[3].outcome {
        RowOutcome::Rejected { fields, .. } => assert_eq!(fields, &vec!["cp"]),
        other => panic!("expected rejection, got {other:?}"),
    }
    match &report.rows[4].outcome {
        RowOutcome::Rejected { fields, .. } => assert_eq!(fields, &vec!["age"]),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn batch_rows_match_single_predictions() {
    let pipeline = direct_pipeline();
    let report = BatchScorer::new(&pipeline)
        .score_reader(EXPORT.as_bytes())
        .expect("export parses");

    let single = pipeline
        .predict(&super::common::sample_raw_record())
        .expect("reference record predicts");
    assert_eq!(report.rows[0].prediction(), Some(&single));
}

#[test]
fn malformed_csv_is_an_error() {
    let pipeline = direct_pipeline();
    let ragged = "age,sex\n63,Male,extra\n";
    assert!(BatchScorer::new(&pipeline)
        .score_reader(ragged.as_bytes())
        .is_err());
}
