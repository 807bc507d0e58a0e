//! Fingerprint-evasion script injected into every crawl session.
//!
//! The script runs before any page script (via
//! `Page.addScriptToEvaluateOnNewDocument`), so the overrides are in place by
//! the time the ad library's detection code executes.

/// Build the stealth injection script for one session.
pub fn stealth_script() -> String {
    let script = r#"
        // 1. Unmask: remove `navigator.webdriver`
        Object.defineProperty(navigator, 'webdriver', {
            get: () => undefined,
        });

        // 2. Hardware concurrency (randomize 4-10, even values)
        Object.defineProperty(navigator, 'hardwareConcurrency', {
            get: () => 4 + Math.floor(Math.random() * 4) * 2,
        });

        // 3. Device memory (4-16 GB)
        Object.defineProperty(navigator, 'deviceMemory', {
            get: () => 4 + Math.floor(Math.random() * 4) * 4,
        });

        // 4. Chrome runtime mock; its absence is the classic headless tell
        window.chrome = {
            runtime: {
                connect: function() {
                    return {
                        onMessage: { addListener: function() {}, removeListener: function() {} },
                        postMessage: function() {},
                        disconnect: function() {}
                    };
                },
                sendMessage: function() {},
                onMessage: { addListener: function() {}, removeListener: function() {} }
            },
            app: { isInstalled: false },
            csi: function() {},
            loadTimes: function() {
                return {
                    navigationType: "Other",
                    wasFetchedViaSpdy: true,
                    npnNegotiatedProtocol: "h2",
                    connectionInfo: "h2"
                };
            }
        };

        // 5. Notification permission must mirror Notification.permission, not 'prompt'
        const originalQuery = window.navigator.permissions.query;
        window.navigator.permissions.query = (parameters) => (
            parameters.name === 'notifications' ?
            Promise.resolve({ state: Notification.permission }) :
            originalQuery(parameters)
        );

        // 6. Plugins: a headless profile reports an empty PluginArray
        Object.defineProperty(navigator, 'plugins', {
            get: () => {
                const pdf = {
                    0: { type: "application/x-google-chrome-pdf", suffixes: "pdf", description: "Portable Document Format" },
                    description: "Portable Document Format",
                    filename: "internal-pdf-viewer",
                    length: 1,
                    name: "Chrome PDF Plugin"
                };
                const p = [pdf, pdf, pdf];
                Object.setPrototypeOf(p, PluginArray.prototype);
                return p;
            }
        });

        // 7. WebGL vendor spoofing (UNMASKED_VENDOR_WEBGL / UNMASKED_RENDERER_WEBGL)
        const getParameter = WebGLRenderingContext.prototype.getParameter;
        WebGLRenderingContext.prototype.getParameter = function(parameter) {
            if (parameter === 37445) return 'Intel Inc.';
            if (parameter === 37446) return 'Intel Iris OpenGL Engine';
            return getParameter.apply(this, [parameter]);
        };

        // 8. WebRTC off; leaking the real local IP defeats everything above
        ['RTCPeerConnection', 'webkitRTCPeerConnection', 'mozRTCPeerConnection'].forEach(className => {
            if (window[className]) {
                window[className] = undefined;
            }
        });
    "#;

    script.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_covers_core_evasions() {
        let script = stealth_script();
        assert!(script.contains("Object.defineProperty(navigator, 'webdriver'"));
        assert!(script.contains("window.chrome = {"));
        assert!(script.contains("navigator.permissions.query"));
        assert!(script.contains("WebGLRenderingContext.prototype.getParameter"));
    }
}
