//! Successor resolution

use crate::domain::{ServiceConfig, Worker};

/// Link every worker to the workers consuming its output.
///
/// `a` feeds `b` when `a` provides the data type `b` needs and either the
/// type is platform independent or `a`'s output platform is the one `b`
/// consumes. Cycles are not prevented here; validation rejects them.
pub fn resolve_successors(service: &ServiceConfig, workers: &mut [Worker]) {
    let next: Vec<Vec<String>> = workers
        .iter()
        .enumerate()
        .map(|(i, producer)| {
            workers
                .iter()
                .enumerate()
                .filter(|&(j, consumer)| i != j && feeds(service, producer, consumer))
                .map(|(_, consumer)| consumer.name.clone())
                .collect()
        })
        .collect();

    for (worker, next) in workers.iter_mut().zip(next) {
        worker.next = next;
    }
}

fn feeds(service: &ServiceConfig, producer: &Worker, consumer: &Worker) -> bool {
    if producer.provides != consumer.needs {
        return false;
    }
    !service.is_platform_specific(&producer.provides)
        || &producer.provides_for_platform == consumer.consumed_platform()
}
