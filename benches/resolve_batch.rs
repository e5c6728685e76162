//! This bench runs classification, synthesis and resolution over a large
//! batch of interdependent function records.

#![allow(missing_docs)]

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use srsgen::{
    Config, FunctionBatch, FunctionName, FunctionRecord, Generator,
    domain::{Input, OperationKind},
    engine::OfflineProse,
};

const ENTITIES: usize = 500;

/// Generates create/read/delete functions for many entities, each depending on
/// its create function and, every tenth entity, on an external sync.
fn preseed_batch() -> FunctionBatch {
    let mut records = vec![
        FunctionRecord::new(FunctionName::new("syncLedger").unwrap(), OperationKind::Integrate)
            .external(),
    ];

    for i in 0..ENTITIES {
        let create = format!("createEntity{i}");
        records.push(
            FunctionRecord::new(FunctionName::new(create.as_str()).unwrap(), OperationKind::Create)
                .with_input(Input::required("name", "string").with_validation("must be unique"))
                .with_outputs("entity id"),
        );

        let mut read = FunctionRecord::new(
            FunctionName::new(format!("getEntity{i}")).unwrap(),
            OperationKind::Read,
        )
        .with_input(Input::required("token", "string"))
        .with_dependency(create.as_str());
        if i % 10 == 0 {
            read = read.with_dependency("syncLedger");
        }
        records.push(read);

        records.push(
            FunctionRecord::new(
                FunctionName::new(format!("deleteEntity{i}")).unwrap(),
                OperationKind::Delete,
            )
            .with_dependency(create),
        );
    }

    FunctionBatch::new(records).unwrap()
}

fn resolve_batch(c: &mut Criterion) {
    let batch = preseed_batch();
    let generator = Generator::new(Config::default(), Arc::new(OfflineProse));

    c.bench_function("plan large batch", |b| {
        b.iter(|| generator.plan(&batch).unwrap());
    });
}

criterion_group!(benches, resolve_batch);
criterion_main!(benches);
