use crate::calc::Calc;
use crate::error::FactoryError;
use collection::{Collection, CollectionDef, CollectionError};
use core_types::{Context, RawRecord};
use std::sync::Arc;

/// The processing logic of a factory.
///
/// `load` type-checks and stores the input collections; `process` runs the
/// calc over them and returns the serialized output records.
pub trait Processor<C: Calc> {
    fn load(&mut self, inputs: &[&Collection]) -> Result<(), FactoryError>;

    fn process(&mut self, calc: &mut C, settings: &Context) -> Result<Vec<RawRecord>, FactoryError>;
}

/// Checks that `input` was built from `expected`.
pub fn expect_input(input: &Collection, expected: &CollectionDef) -> Result<(), FactoryError> {
    if **input.def() != *expected {
        return Err(FactoryError::InputMismatch {
            expected: expected.qualified_name(),
            found: input.def().qualified_name(),
        });
    }
    Ok(())
}

/// Runs a calc through a processor and collects the results into an output
/// collection.
pub struct Factory<C: Calc, P: Processor<C>> {
    calc: C,
    processor: P,
    output: Collection,
}

impl<C: Calc, P: Processor<C>> Factory<C, P> {
    pub fn new(calc: C, processor: P, output: Arc<CollectionDef>) -> Self {
        Self {
            calc,
            processor,
            output: Collection::new(output),
        }
    }

    /// Builds the calc from `settings`.
    pub fn from_settings(
        settings: &Context,
        processor: P,
        output: Arc<CollectionDef>,
    ) -> Result<Self, FactoryError> {
        let calc = C::from_settings(settings)?;
        Ok(Self::new(calc, processor, output))
    }

    pub fn load(&mut self, inputs: &[&Collection]) -> Result<&mut Self, FactoryError> {
        self.processor.load(inputs)?;
        Ok(self)
    }

    pub fn calc(&self) -> &C {
        &self.calc
    }

    pub fn calc_mut(&mut self) -> &mut C {
        &mut self.calc
    }

    pub fn output_collection(&self) -> &Collection {
        &self.output
    }

    pub fn into_output(self) -> Collection {
        self.output
    }

    /// Runs the processor and loads its records into the output collection.
    ///
    /// With `reset` a fresh output collection is started first; without it the
    /// results accumulate on the current one.
    pub fn create(&mut self, reset: bool, settings: &Context) -> Result<&Collection, FactoryError> {
        if reset {
            self.output = Collection::new(Arc::clone(self.output.def()));
        }
        let collection = self.output.def().qualified_name();

        let records = self.processor.process(&mut self.calc, settings)?;
        if records.is_empty() {
            tracing::error!(%collection, "processor produced no records");
            return Err(FactoryError::ProcessorFailure(collection));
        }

        match self.output.load_data(records) {
            Ok(_) => {}
            Err(err @ CollectionError::Validation { .. }) => {
                return Err(FactoryError::CreateValidation {
                    collection,
                    source: err,
                });
            }
            Err(err) => return Err(err.into()),
        }
        tracing::debug!(%collection, total = self.output.len(), "factory created records");
        Ok(&self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{CalcResult, setting, setting_or};
    use crate::error::CalcError;
    use collection::CollectionBuilder;
    use core_types::Value;
    use schema::{Field, FieldKind, Schema};
    use serde::Serialize;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn reading_def() -> Arc<CollectionDef> {
        let schema = Schema::builder("Reading")
            .field(Field::new("bdbid", FieldKind::Integer))
            .field(Field::new("value", FieldKind::Float))
            .build()
            .unwrap();
        CollectionBuilder::new("Reading").build(schema).unwrap()
    }

    fn summary_def() -> Arc<CollectionDef> {
        let schema = Schema::builder("Summary")
            .field(Field::new("bdbid", FieldKind::Integer).required())
            .field(Field::new("total", FieldKind::Float).required())
            .build()
            .unwrap();
        CollectionBuilder::new("Summary").build(schema).unwrap()
    }

    #[derive(Serialize)]
    struct Summary {
        bdbid: i64,
        total: Total,
    }

    #[derive(Serialize)]
    #[serde(untagged)]
    enum Total {
        Float(f64),
        Text(&'static str),
    }

    /// Sums `value` per building and multiplies by `scale`.
    struct ScaledTotals {
        scale: f64,
        broken: bool,
    }

    impl Calc for ScaledTotals {
        type Output = Summary;

        fn from_settings(settings: &Context) -> Result<Self, CalcError> {
            Ok(Self {
                scale: setting(settings, "scale")?,
                broken: setting_or(settings, "broken", false)?,
            })
        }

        fn calculate(&mut self, input: &Collection) -> Result<Vec<Summary>, CalcError> {
            let mut totals: BTreeMap<i64, f64> = BTreeMap::new();
            for record in input {
                let (Some(Value::Int(id)), Some(value)) = (record.get("bdbid"), record.get("value")) else {
                    return Err(CalcError::Failed("incomplete reading".into()));
                };
                *totals.entry(*id).or_default() += value.as_f64().unwrap_or(0.0);
            }
            Ok(totals
                .into_iter()
                .map(|(bdbid, total)| Summary {
                    bdbid,
                    total: if self.broken {
                        Total::Text("lots")
                    } else {
                        Total::Float(total * self.scale)
                    },
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct TotalsProcessor {
        readings: Option<Collection>,
    }

    impl Processor<ScaledTotals> for TotalsProcessor {
        fn load(&mut self, inputs: &[&Collection]) -> Result<(), FactoryError> {
            let [readings] = inputs else {
                return Err(FactoryError::InputCount {
                    expected: 1,
                    found: inputs.len(),
                });
            };
            expect_input(readings, &reading_def())?;
            self.readings = Some((*readings).clone());
            Ok(())
        }

        fn process(&mut self, calc: &mut ScaledTotals, _settings: &Context) -> Result<Vec<RawRecord>, FactoryError> {
            let readings = self
                .readings
                .as_ref()
                .ok_or_else(|| FactoryError::MissingInput("ReadingCollection".into()))?;
            let results = calc.calculate(readings)?;
            Ok(results
                .iter()
                .map(|r| r.to_record())
                .collect::<Result<Vec<_>, CalcError>>()?)
        }
    }

    fn readings() -> Collection {
        let mut c = Collection::new(reading_def());
        c.load_data(json!([
            {"bdbid": 1, "value": 1.0},
            {"bdbid": 1, "value": 2.0},
            {"bdbid": 2, "value": 4.0},
        ]))
        .unwrap();
        c
    }

    fn factory(settings: serde_json::Value) -> Factory<ScaledTotals, TotalsProcessor> {
        let settings: Context = serde_json::from_value(settings).unwrap();
        Factory::from_settings(&settings, TotalsProcessor::default(), summary_def()).unwrap()
    }

    #[test]
    fn creates_output_records() {
        let mut f = factory(json!({"scale": 2.0}));
        let input = readings();
        f.load(&[&input]).unwrap();

        let out = f.create(true, &Context::new()).unwrap();
        assert_eq!(out.name(), "SummaryCollection");
        assert_eq!(
            serde_json::Value::Array(out.data().into_iter().map(serde_json::Value::Object).collect()),
            json!([{"bdbid": 1, "total": 6.0}, {"bdbid": 2, "total": 8.0}])
        );
    }

    #[test]
    fn reset_controls_accumulation() {
        let mut f = factory(json!({"scale": 1.0}));
        let input = readings();
        f.load(&[&input]).unwrap();

        f.create(true, &Context::new()).unwrap();
        assert_eq!(f.create(false, &Context::new()).unwrap().len(), 4);
        assert_eq!(f.create(true, &Context::new()).unwrap().len(), 2);
    }

    #[test]
    fn bad_settings_fail_construction() {
        let settings = Context::new();
        let err = Factory::<ScaledTotals, _>::from_settings(&settings, TotalsProcessor::default(), summary_def())
            .err()
            .unwrap();
        assert!(matches!(err, FactoryError::Calc(CalcError::MissingSetting(_))));
    }

    #[test]
    fn load_checks_input_types() {
        let mut f = factory(json!({"scale": 1.0}));
        let wrong = Collection::new(summary_def());
        assert!(matches!(
            f.load(&[&wrong]),
            Err(FactoryError::InputMismatch { .. })
        ));
        assert!(matches!(f.load(&[]), Err(FactoryError::InputCount { found: 0, .. })));
    }

    #[test]
    fn empty_results_are_a_processor_failure() {
        let mut f = factory(json!({"scale": 1.0}));
        let empty = Collection::new(reading_def());
        f.load(&[&empty]).unwrap();
        assert!(matches!(
            f.create(true, &Context::new()),
            Err(FactoryError::ProcessorFailure(_))
        ));
    }

    #[test]
    fn invalid_results_are_a_create_validation_error() {
        let mut f = factory(json!({"scale": 1.0, "broken": true}));
        let input = readings();
        f.load(&[&input]).unwrap();

        let err = f.create(true, &Context::new()).unwrap_err();
        assert!(matches!(err, FactoryError::CreateValidation { .. }));
        assert!(f.output_collection().is_empty());
    }
}
