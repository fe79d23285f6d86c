use std::time::Duration;

use bbx_sched::{EdfScheduler, LowLatencyScheduler, SchedulerClass, SchedulerOps, SchedulingDomain, Task, TaskId, TaskResult};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

const TASK_COUNTS: &[usize] = &[1, 8, 32, 128];

fn bench_low_latency_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("low_latency_tick");

    for &n in TASK_COUNTS {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut sched = LowLatencyScheduler::new(SchedulingDomain::Timer { period: Duration::from_micros(1000) });
            for i in 0..n {
                let id = TaskId(i as u32);
                sched
                    .task_init(Task::new(id, SchedulerClass::LowLatency, (i % 10) as u8, Duration::from_micros(1000), || {
                        TaskResult::Ok
                    }))
                    .unwrap();
                sched.schedule_task(id).unwrap();
            }

            b.iter(|| {
                sched.tick(&[]);
            });
        });
    }

    group.finish();
}

/// Every task enqueued with a distinct deadline so each `run_to_completion`
/// pass does real `BinaryHeap` work instead of draining a one-element heap.
fn bench_edf_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("edf_drain_ready_queue");

    for &n in TASK_COUNTS {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(
                || {
                    let mut sched = EdfScheduler::new();
                    for i in 0..n {
                        let id = TaskId(i as u32);
                        sched
                            .task_init(Task::new(id, SchedulerClass::Edf, (i % 10) as u8, Duration::from_millis(50), || TaskResult::Ok))
                            .unwrap();
                        sched.enqueue(id, Duration::from_micros((n - i) as u64 * 10)).unwrap();
                    }
                    sched
                },
                |mut sched| sched.run_to_completion(),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_low_latency_tick, bench_edf_drain);
criterion_main!(benches);
