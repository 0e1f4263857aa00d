//! Derivative dispatch

use depot_core::models::{ContentKind, JobKind};

/// Follow-on jobs for a freshly characterized object.
///
/// Pure: no de-duplication against jobs already queued for the object.
pub fn derivative_jobs(kind: ContentKind) -> Vec<JobKind> {
    match kind {
        ContentKind::Image | ContentKind::Pdf => vec![JobKind::GenerateThumbnail],
        ContentKind::Video => vec![JobKind::GenerateThumbnail, JobKind::TranscodeVideo],
        ContentKind::Audio => vec![JobKind::TranscodeAudio],
        ContentKind::Other => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(jobs: &[JobKind], kind: JobKind) -> usize {
        jobs.iter().filter(|j| **j == kind).count()
    }

    #[test]
    fn test_image_and_pdf_get_one_thumbnail() {
        for kind in [ContentKind::Image, ContentKind::Pdf] {
            let jobs = derivative_jobs(kind);
            assert_eq!(count(&jobs, JobKind::GenerateThumbnail), 1);
            assert_eq!(count(&jobs, JobKind::TranscodeAudio), 0);
            assert_eq!(count(&jobs, JobKind::TranscodeVideo), 0);
        }
    }

    #[test]
    fn test_video_gets_thumbnail_and_video_transcode() {
        let jobs = derivative_jobs(ContentKind::Video);
        assert_eq!(count(&jobs, JobKind::GenerateThumbnail), 1);
        assert_eq!(count(&jobs, JobKind::TranscodeVideo), 1);
        assert_eq!(count(&jobs, JobKind::TranscodeAudio), 0);
    }

    #[test]
    fn test_audio_gets_audio_transcode_only() {
        let jobs = derivative_jobs(ContentKind::Audio);
        assert_eq!(jobs, vec![JobKind::TranscodeAudio]);
    }

    #[test]
    fn test_other_gets_nothing() {
        assert!(derivative_jobs(ContentKind::Other).is_empty());
    }

    #[test]
    fn test_never_schedules_characterization() {
        for kind in ContentKind::ALL {
            assert!(!derivative_jobs(kind).contains(&JobKind::Characterize));
        }
    }
}
