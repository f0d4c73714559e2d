//! Built-in probe catalog.

use super::ProbeDefinition;

const RDMA_CREATE_ID_NET: &str = r#"static int __init modinit(void)
{
	return rdma_create_id(NULL, NULL, NULL, 0, 0) != NULL;
}

module_init(modinit);

MODULE_LICENSE("GPL");
"#;

/// Does `rdma_create_id()` take a network-namespace argument?
///
/// Kernels that added namespace support to the RDMA connection manager grew
/// `rdma_create_id(net, handler, context, ps, qp_type)`; older ones have the
/// four-argument form and fail this probe with an argument-count error.
pub fn rdma_create_id_net() -> ProbeDefinition {
    ProbeDefinition {
        name: "rdma_create_id_net".to_string(),
        source: RDMA_CREATE_ID_NET.to_string(),
        headers: vec!["linux/module.h".to_string(), "rdma/rdma_cm.h".to_string()],
        link_required: false,
        symbol: Some("rdma_create_id".to_string()),
    }
}

/// All built-in probes, sorted by name.
pub fn all() -> Vec<ProbeDefinition> {
    vec![rdma_create_id_net()]
}
