use crate::time::sleep_ms;
use crate::DepthScanConverter;
use crossbeam_channel::{Receiver, Sender};
use depthscan_data::{DepthFrame, LaserScan};
use std::sync::mpsc;
use std::thread::JoinHandle;

/// Struct that contains the conversion worker thread.
pub struct ConverterThreads {
    pub(crate) worker_terminator_tx: Sender<bool>,
    pub(crate) worker_thread: Option<JoinHandle<()>>,
}

pub(crate) fn convert_frames(
    converter: DepthScanConverter,
    frame_rx: mpsc::Receiver<DepthFrame>,
    scan_tx: mpsc::SyncSender<LaserScan>,
    worker_terminator_rx: Receiver<bool>,
) {
    while !do_terminate(&worker_terminator_rx) {
        let frame = match frame_rx.try_recv() {
            Ok(frame) => frame,
            Err(_) => {
                sleep_ms(10);
                continue;
            }
        };

        match converter.convert(&frame.image, &frame.intrinsics) {
            Ok(scan) => {
                if scan_tx.send(scan).is_err() {
                    // Receiver is gone, nobody wants further scans.
                    return;
                }
            }
            Err(e) => log::warn!("dropping depth frame: {e}"),
        }
    }
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

/// Function to join the worker thread.
/// This function is automatically called when `converter_threads` is dropped.
pub fn join(converter_threads: &mut ConverterThreads) {
    let _ = converter_threads.worker_terminator_tx.send(true);

    if converter_threads.worker_thread.is_some() {
        let thread = converter_threads.worker_thread.take().unwrap();
        thread.join().unwrap();
    }
}

impl Drop for ConverterThreads {
    fn drop(&mut self) {
        join(self);
    }
}
