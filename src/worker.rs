//! Decode worker
//!
//! A dedicated thread that owns the [`Decoder`] and turns frames into
//! outcomes, one at a time, in arrival order. It talks to the coordinator
//! only through channels.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::decoder::{Decoder, DecoderError};
use crate::error::{FrameError, SessionError};
use crate::models::{Payload, ScanRect};
use crate::session::messages::{CoordinatorMessage, DecodeOutcome, DecodeRequest, WorkerMessage};
use crate::utils::transform::transform_frame;

/// Running decode thread plus the sending half of its queue
pub(crate) struct DecodeWorker {
    request_tx: Sender<WorkerMessage>,
    join: Option<JoinHandle<()>>,
}

impl DecodeWorker {
    /// Spawn the worker thread; it reports outcomes on `outcome_tx`
    pub(crate) fn spawn(
        decoder: Box<dyn Decoder>,
        outcome_tx: Sender<CoordinatorMessage>,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<WorkerMessage>();
        let crop = config.crop_to_rect;

        let mut builder = thread::Builder::new().name(config.worker_thread_name.clone());
        if let Some(stack_size) = config.worker_stack_size {
            builder = builder.stack_size(stack_size);
        }

        let join = builder
            .spawn(move || run_decode_worker(decoder, request_rx, outcome_tx, crop))
            .map_err(SessionError::WorkerStart)?;

        debug!(thread = %config.worker_thread_name, crop, "decode worker started");
        Ok(Self {
            request_tx,
            join: Some(join),
        })
    }

    /// Queue a request; `false` if the worker has already exited
    pub(crate) fn submit(&self, request: DecodeRequest) -> bool {
        self.request_tx.send(WorkerMessage::Decode(request)).is_ok()
    }

    /// True until [`DecodeWorker::shutdown`] has joined the thread
    pub(crate) fn is_running(&self) -> bool {
        self.join.is_some()
    }

    /// Post `Quit` and wait for the thread to exit
    ///
    /// A decode already in progress finishes first. Requests queued behind
    /// the quit are never decoded. Safe to call more than once.
    pub(crate) fn shutdown(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.request_tx.send(WorkerMessage::Quit);
        if join.join().is_err() {
            warn!("decode worker thread panicked");
        }
        debug!("decode worker joined");
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_decode_worker(
    mut decoder: Box<dyn Decoder>,
    request_rx: Receiver<WorkerMessage>,
    outcome_tx: Sender<CoordinatorMessage>,
    crop: bool,
) {
    while let Ok(message) = request_rx.recv() {
        let request = match message {
            WorkerMessage::Decode(request) => request,
            WorkerMessage::Quit => break,
        };

        let id = request.id;
        let outcome = decode_request(decoder.as_mut(), request, crop);
        let reply = CoordinatorMessage::Outcome {
            request: id,
            outcome,
        };
        if outcome_tx.send(reply).is_err() {
            debug!(request = %id, "coordinator gone, decode worker exiting");
            break;
        }
    }
}

/// Why one decode attempt produced nothing
#[derive(Debug, Error)]
enum AttemptError {
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Decoder(#[from] DecoderError),
}

/// Transform and decode one request
///
/// Never fails: bad frames, decoder errors and panics anywhere in the
/// attempt all come back as [`DecodeOutcome::Failure`]. The payload itself is
/// never logged.
pub(crate) fn decode_request(
    decoder: &mut dyn Decoder,
    request: DecodeRequest,
    crop: bool,
) -> DecodeOutcome {
    let start = Instant::now();
    let id = request.id;

    let result = catch_unwind(AssertUnwindSafe(|| attempt_decode(decoder, request, crop)));
    match result {
        Ok(Ok(Some(payload))) => {
            info!(
                request = %id,
                elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                len = payload.len(),
                "found symbol"
            );
            DecodeOutcome::Success(payload)
        }
        Ok(Ok(None)) => DecodeOutcome::Failure,
        Ok(Err(err)) => {
            warn!(request = %id, error = %err, "decode attempt failed");
            DecodeOutcome::Failure
        }
        Err(_) => {
            warn!(request = %id, "decode attempt panicked");
            DecodeOutcome::Failure
        }
    }
}

fn attempt_decode(
    decoder: &mut dyn Decoder,
    request: DecodeRequest,
    crop: bool,
) -> Result<Option<Payload>, AttemptError> {
    let DecodeRequest { frame, rect, .. } = request;
    let transformed = transform_frame(&frame, &rect)?;
    drop(frame);

    let (image, rect) = if crop {
        let image = transformed.cropped();
        let full = ScanRect::full(image.width(), image.height());
        (image, full)
    } else {
        (transformed.image, transformed.rect)
    };

    Ok(decoder.decode(&image, &rect)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frame, LumaImage, PixelFormat, Rotation};
    use crate::session::messages::RequestId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn request(id: u64, frame: Frame, rect: ScanRect) -> DecodeRequest {
        DecodeRequest {
            id: RequestId::new(id),
            frame,
            rect,
        }
    }

    fn gradient(width: usize, height: usize) -> Frame {
        let data = (0..width * height).map(|i| i as u8).collect();
        Frame::luma(data, width, height)
    }

    #[test]
    fn test_decode_request_success() {
        let mut decoder = |_: &LumaImage, _: &ScanRect| Some(Payload::new("hello"));
        let outcome = decode_request(&mut decoder, request(1, gradient(4, 4), ScanRect::full(4, 4)), false);
        assert_eq!(outcome, DecodeOutcome::Success(Payload::new("hello")));
    }

    #[test]
    fn test_decode_request_no_symbol() {
        let mut decoder = |_: &LumaImage, _: &ScanRect| -> Option<Payload> { None };
        let outcome = decode_request(&mut decoder, request(1, gradient(4, 4), ScanRect::full(4, 4)), false);
        assert_eq!(outcome, DecodeOutcome::Failure);
    }

    #[test]
    fn test_decode_request_bad_frame_is_failure() {
        let mut calls = 0;
        let mut decoder = |_: &LumaImage, _: &ScanRect| {
            calls += 1;
            Some(Payload::new("never"))
        };
        let frame = Frame::new(vec![0; 3], 4, 4, PixelFormat::Luma8);
        let outcome = decode_request(&mut decoder, request(1, frame, ScanRect::full(4, 4)), false);
        assert_eq!(outcome, DecodeOutcome::Failure);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_decode_request_oversized_frame_is_failure() {
        let mut calls = 0;
        let mut decoder = |_: &LumaImage, _: &ScanRect| -> Option<Payload> {
            calls += 1;
            None
        };
        let frame = Frame::luma(vec![0; 4], usize::MAX / 2 + 1, 2);
        let outcome = decode_request(&mut decoder, request(1, frame, ScanRect::full(4, 4)), false);
        assert_eq!(outcome, DecodeOutcome::Failure);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_decode_request_decoder_error_is_failure() {
        struct Broken;
        impl Decoder for Broken {
            fn decode(
                &mut self,
                _: &LumaImage,
                _: &ScanRect,
            ) -> Result<Option<Payload>, DecoderError> {
                Err(DecoderError::Unavailable)
            }
        }
        let outcome = decode_request(&mut Broken, request(1, gradient(2, 2), ScanRect::full(2, 2)), false);
        assert_eq!(outcome, DecodeOutcome::Failure);
    }

    #[test]
    fn test_decode_request_decoder_panic_is_failure() {
        let mut decoder = |_: &LumaImage, _: &ScanRect| -> Option<Payload> { panic!("boom") };
        let outcome = decode_request(&mut decoder, request(1, gradient(2, 2), ScanRect::full(2, 2)), false);
        assert_eq!(outcome, DecodeOutcome::Failure);
    }

    #[test]
    fn test_decode_request_rotates_before_decode() {
        let mut seen = None;
        let mut decoder = |image: &LumaImage, rect: &ScanRect| -> Option<Payload> {
            seen = Some((image.width(), image.height(), image.get(0, 0), *rect));
            None
        };
        // 3x2 sensor frame; after a quarter turn the bottom-left sample is first.
        let frame = Frame::luma(vec![1, 2, 3, 4, 5, 6], 3, 2).with_rotation(Rotation::Cw90);
        decode_request(&mut decoder, request(1, frame, ScanRect::new(0, 0, 3, 1)), false);
        let (width, height, first, rect) = seen.unwrap();
        assert_eq!((width, height), (2, 3));
        assert_eq!(first, 4);
        assert_eq!(rect, ScanRect::new(1, 0, 1, 3));
    }

    #[test]
    fn test_decode_request_crop_hands_only_rect() {
        let mut seen = None;
        let mut decoder = |image: &LumaImage, rect: &ScanRect| -> Option<Payload> {
            seen = Some((image.width(), image.height(), image.get(0, 0), *rect));
            None
        };
        let frame = gradient(8, 8);
        decode_request(&mut decoder, request(1, frame, ScanRect::new(2, 3, 4, 2)), true);
        let (width, height, first, rect) = seen.unwrap();
        assert_eq!((width, height), (4, 2));
        assert_eq!(first, (3 * 8 + 2) as u8);
        assert_eq!(rect, ScanRect::full(4, 2));
    }

    #[test]
    fn test_worker_processes_in_order_and_quits() {
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        let decoder = |image: &LumaImage, _: &ScanRect| {
            (image.get(0, 0) % 2 == 0).then(|| Payload::new(image.get(0, 0).to_string()))
        };
        let config = SessionConfig::default().with_worker_thread_name("zscan-test-worker");
        let mut worker = DecodeWorker::spawn(Box::new(decoder), outcome_tx, &config).unwrap();
        assert!(worker.is_running());

        for id in 1..=4u64 {
            let frame = Frame::luma(vec![id as u8; 4], 2, 2);
            assert!(worker.submit(request(id, frame, ScanRect::full(2, 2))));
        }

        let mut seen = Vec::new();
        for _ in 0..4 {
            match outcome_rx.recv_timeout(Duration::from_secs(5)).unwrap() {
                CoordinatorMessage::Outcome { request, outcome } => {
                    seen.push((request.get(), outcome.is_success()))
                }
                other => panic!("unexpected message {other:?}"),
            }
        }
        assert_eq!(seen, vec![(1, false), (2, true), (3, false), (4, true)]);

        worker.shutdown();
        assert!(!worker.is_running());
        assert!(!worker.submit(request(5, gradient(2, 2), ScanRect::full(2, 2))));
        worker.shutdown();
    }

    #[test]
    fn test_requests_behind_quit_are_not_decoded() {
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded();
        let (entered_tx, entered_rx) = crossbeam_channel::bounded::<()>(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_decoder = calls.clone();
        let decoder = move |_: &LumaImage, _: &ScanRect| -> Option<Payload> {
            calls_in_decoder.fetch_add(1, Ordering::SeqCst);
            let _ = entered_tx.send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            None
        };
        let config = SessionConfig::default().with_worker_thread_name("zscan-test-quit");
        let mut worker = DecodeWorker::spawn(Box::new(decoder), outcome_tx, &config).unwrap();

        assert!(worker.submit(request(1, gradient(2, 2), ScanRect::full(2, 2))));
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Queue Quit and then another request while the first is still decoding.
        worker.request_tx.send(WorkerMessage::Quit).unwrap();
        assert!(worker.submit(request(2, gradient(2, 2), ScanRect::full(2, 2))));
        release_tx.send(()).unwrap();

        worker.join.take().unwrap().join().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let ids: Vec<u64> = outcome_rx
            .try_iter()
            .filter_map(|message| match message {
                CoordinatorMessage::Outcome { request, .. } => Some(request.get()),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_worker_start_failure() {
        let (outcome_tx, _outcome_rx) = crossbeam_channel::unbounded();
        let decoder = |_: &LumaImage, _: &ScanRect| -> Option<Payload> { None };
        let config = SessionConfig::default().with_worker_stack_size(1 << 50);
        let result = DecodeWorker::spawn(Box::new(decoder), outcome_tx, &config);
        assert!(matches!(result, Err(SessionError::WorkerStart(_))));
    }
}
