use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use taskpool::{ExecutorService, FnTask, WorkBalancingPool, WorkStealingPool};

// Tasks submitted per benchmark iteration
const TOTAL_TASKS: usize = 4096;

/// Submit-and-drain one full batch through the given service.
fn run_batch(mut service: Box<dyn ExecutorService>) {
    let counter = Arc::new(AtomicUsize::new(0));

    for _ in 0..TOTAL_TASKS {
        let counter = Arc::clone(&counter);
        service.submit(Arc::new(FnTask::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })));
    }
    service.shutdown();

    assert_eq!(black_box(counter.load(Ordering::Relaxed)), TOTAL_TASKS);
}

fn bench_strategy(
    c: &mut Criterion,
    group_name: &str,
    make_service: impl Fn(usize) -> Box<dyn ExecutorService>,
) {
    let mut group = c.benchmark_group(group_name);
    let max_capacity = num_cpus::get().max(2);

    for capacity in [1, 2, 4, 8] {
        if capacity > max_capacity {
            break;
        }

        group.throughput(Throughput::Elements(TOTAL_TASKS as u64));
        group.bench_function(format!("tasks/{TOTAL_TASKS}/workers/{capacity}"), |b| {
            b.iter(|| run_batch(make_service(capacity)));
        });
    }

    group.finish();
}

fn benchmark_work_stealing(c: &mut Criterion) {
    bench_strategy(c, "drain/work_stealing", |capacity| {
        Box::new(WorkStealingPool::new(capacity, 1))
    })
}

fn benchmark_work_balancing(c: &mut Criterion) {
    bench_strategy(c, "drain/work_balancing", |capacity| {
        Box::new(WorkBalancingPool::new(capacity, 4))
    })
}

criterion_group!(benches, benchmark_work_stealing, benchmark_work_balancing);
criterion_main!(benches);
