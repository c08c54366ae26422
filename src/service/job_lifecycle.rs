// service/job_lifecycle.rs
use crate::{
    models::jobmodel::{Job, JobStatus, JobType},
    service::error::ServiceError,
};

pub struct JobStateMachine;

impl JobStateMachine {
    pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
        matches!(
            (from, to),
            (JobStatus::Posted, JobStatus::Assigned)
                // Re-assignment replaces the worker and puts the job back to assigned.
                | (JobStatus::Assigned, JobStatus::Assigned)
                | (JobStatus::InProgress, JobStatus::Assigned)
                | (JobStatus::Assigned, JobStatus::InProgress)
                | (JobStatus::Assigned, JobStatus::Completed)
                | (JobStatus::InProgress, JobStatus::Completed)
                | (JobStatus::Posted, JobStatus::Cancelled)
                | (JobStatus::Assigned, JobStatus::Cancelled)
        )
    }

    pub fn transition(job: &Job, to: JobStatus) -> Result<JobStatus, ServiceError> {
        if Self::can_transition(job.status, to) {
            return Ok(to);
        }

        Err(ServiceError::InvalidJobStatus(job.id, job.status, to))
    }
}

/// Bids are only taken, and accepted, while a bidding job is still posted.
pub fn ensure_open_for_bids(job: &Job) -> Result<(), ServiceError> {
    if job.job_type != JobType::Bidding {
        return Err(ServiceError::Validation(format!(
            "Job {} is a direct hire job and does not take bids",
            job.id
        )));
    }

    if job.status != JobStatus::Posted {
        return Err(ServiceError::Validation(format!(
            "Job {} is {} and no longer open for bidding",
            job.id, job.status
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::sample_job;

    const ALL: [JobStatus; 5] = [
        JobStatus::Posted,
        JobStatus::Assigned,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    #[test]
    fn completion_only_from_assigned_or_in_progress() {
        for from in ALL {
            let allowed = matches!(from, JobStatus::Assigned | JobStatus::InProgress);
            assert_eq!(JobStateMachine::can_transition(from, JobStatus::Completed), allowed, "{from}");
        }
    }

    #[test]
    fn terminal_states_go_nowhere() {
        for to in ALL {
            assert!(!JobStateMachine::can_transition(JobStatus::Completed, to));
            assert!(!JobStateMachine::can_transition(JobStatus::Cancelled, to));
        }
    }

    #[test]
    fn transition_reports_job_and_states() {
        let mut job = sample_job(JobType::DirectHire);
        job.status = JobStatus::Completed;

        match JobStateMachine::transition(&job, JobStatus::Completed) {
            Err(ServiceError::InvalidJobStatus(id, from, to)) => {
                assert_eq!(id, job.id);
                assert_eq!(from, JobStatus::Completed);
                assert_eq!(to, JobStatus::Completed);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bids_need_a_posted_bidding_job() {
        let job = sample_job(JobType::Bidding);
        assert!(ensure_open_for_bids(&job).is_ok());

        let direct = sample_job(JobType::DirectHire);
        assert!(matches!(ensure_open_for_bids(&direct), Err(ServiceError::Validation(_))));

        let mut assigned = sample_job(JobType::Bidding);
        assigned.status = JobStatus::Assigned;
        assert!(matches!(ensure_open_for_bids(&assigned), Err(ServiceError::Validation(_))));
    }
}
