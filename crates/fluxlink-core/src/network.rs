//! Network configuration and wifi scan types exchanged with backends

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMethod {
    Dhcp,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiMode {
    /// Join an existing access point
    Client,
    /// Act as an access point
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "WPA-PSK")]
    WpaPsk,
    #[serde(rename = "WPA2-PSK")]
    Wpa2Psk,
}

/// Settings passed to `modify_network`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSettings {
    pub method: NetworkMethod,
    pub wifi_mode: WifiMode,
    pub ssid: String,
    pub security: WifiSecurity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wepkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipaddr: Option<Ipv4Addr>,
    /// Netmask as prefix length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Ipv4Addr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<Ipv4Addr>,
}

impl NetworkSettings {
    /// Join `ssid` as a DHCP client
    pub fn dhcp_client(
        ssid: impl Into<String>,
        security: WifiSecurity,
        key: Option<String>,
    ) -> Self {
        let (wepkey, psk) = match security {
            WifiSecurity::Wep => (key, None),
            WifiSecurity::WpaPsk | WifiSecurity::Wpa2Psk => (None, key),
            WifiSecurity::None => (None, None),
        };
        Self {
            method: NetworkMethod::Dhcp,
            wifi_mode: WifiMode::Client,
            ssid: ssid.into(),
            security,
            wepkey,
            psk,
            ipaddr: None,
            mask: None,
            route: None,
            dns: Vec::new(),
        }
    }

    /// Switch to static addressing
    pub fn with_static(
        mut self,
        ipaddr: Ipv4Addr,
        mask: u8,
        route: Ipv4Addr,
        dns: Vec<Ipv4Addr>,
    ) -> Self {
        self.method = NetworkMethod::Static;
        self.ipaddr = Some(ipaddr);
        self.mask = Some(mask);
        self.route = Some(route);
        self.dns = dns;
        self
    }
}

/// One access point seen by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Signal strength in dBm
    pub signal: i32,
    pub security: WifiSecurity,
}
