//! Per-interface capture worker threads (spec.md §4.E, §5).

use std::sync::Arc;
use std::time::SystemTime;

use crate::aggregator::Aggregator;
use crate::decode::decode_packet;
use crate::flow::{FlowKey, PacketObservation};
use crate::interface_registry::{InterfaceId, InterfaceRegistry};

use super::{BpfPreset, CaptureDriver, CaptureSession};

/// Spawns one named OS thread per opened interface, running an endless
/// frame loop until `break_loop` is called on its session.
///
/// Returns the join handles for interfaces that opened successfully; an
/// interface whose `open_live` or filter compile fails is logged and
/// skipped (spec.md §4.E, §7), not treated as fatal.
pub fn spawn_workers<D>(
    driver: &D,
    preset: Option<&BpfPreset>,
    aggregator: Arc<Aggregator>,
    registry: Arc<InterfaceRegistry>,
) -> (Vec<std::thread::JoinHandle<()>>, Vec<Arc<dyn Fn() + Send + Sync>>)
where
    D: CaptureDriver,
    D::Session: 'static,
{
    let interfaces = match driver.enumerate_interfaces() {
        Ok(list) => list,
        Err(e) => {
            tracing::error!("interface enumeration failed: {e}");
            return (Vec::new(), Vec::new());
        }
    };

    let mut handles = Vec::new();
    let mut breakers: Vec<Arc<dyn Fn() + Send + Sync>> = Vec::new();

    for (idx, iface) in interfaces.into_iter().enumerate() {
        let mut session = match driver.open_live(&iface.system_name) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("skipping interface {}: {e}", iface.system_name);
                continue;
            }
        };

        if let Some(preset) = preset {
            if let Err(e) = driver.compile_and_set_filter(&mut session, &preset.filter_expression()) {
                tracing::warn!("skipping interface {}: {e}", iface.system_name);
                continue;
            }
        }

        let interface_id = InterfaceId(idx as u32);
        let label = if iface.human_description.is_empty() {
            iface.system_name.clone()
        } else {
            iface.human_description.clone()
        };
        registry.register(interface_id, label.clone());

        let breaker = session.breaker();
        let agg = Arc::clone(&aggregator);
        let thread_name = format!("capture-{label}");

        let handle = std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let mut session = session;
                run_worker_loop(&mut session, &label, &agg)
            })
            .expect("failed to spawn capture worker thread");

        handles.push(handle);
        breakers.push(breaker);
    }

    (handles, breakers)
}

fn run_worker_loop<S: CaptureSession>(session: &mut S, label: &str, aggregator: &Aggregator) {
    let result = session.read_loop(&mut |wire_len, data| {
        let Some(decoded) = decode_packet(data) else {
            return;
        };
        if let Some(exchange) = decoded.ike_exchange {
            tracing::debug!("{label}: IKEv2 {exchange} from {}", decoded.src_addr);
        }
        let key = FlowKey {
            interface_label: label.to_string(),
            peer_address: decoded.src_addr,
            transport: decoded.transport,
        };
        let obs = PacketObservation {
            wire_len,
            src_port: decoded.src_port,
            dst_port: decoded.dst_port,
            app_name: decoded.app_name.as_deref(),
            link_kind: decoded.link_kind,
            now: SystemTime::now(),
        };
        aggregator.update(key, &obs);
    });

    if let Err(e) = result {
        tracing::warn!("capture read failed on {label}: {e}");
    }
    tracing::info!("capture worker for {label} exiting");
}
