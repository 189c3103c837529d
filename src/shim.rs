//! API polyfill shim generation
//!
//! Produces the self-contained script injected into popup windows before
//! any extension code runs. The shim carries an embedded snapshot of the
//! tab list so `tabs.query` answers without a round trip, and forwards
//! every escaping call over the shell's request/response channel; it has
//! no capability of its own.

use crate::models::Tab;

/// Name of the generated shim file under the extensions root.
pub const SHIM_FILE: &str = "popup-shim.js";

const SNAPSHOT_PLACEHOLDER: &str = "__TAB_SNAPSHOT__";

/// Render the shim with the given tab snapshot baked in.
pub fn generate(tab_snapshot: &[Tab]) -> String {
    let snapshot =
        serde_json::to_string(tab_snapshot).unwrap_or_else(|_| "[]".to_string());
    SHIM_TEMPLATE.replace(SNAPSHOT_PLACEHOLDER, &snapshot)
}

const SHIM_TEMPLATE: &str = r#"// Extension API compatibility shim
// Regenerated before every popup open so the embedded tab snapshot
// reflects reality at open time.

(function () {
  'use strict';

  // Define the namespace only if absent; never overwrite a richer
  // implementation that is already present.
  if (window.chrome && window.chrome.tabs) {
    return;
  }

  var TABS = __TAB_SNAPSHOT__;

  var EXTENSION_ID = (function () {
    try {
      return window.location.hostname || '';
    } catch (e) {
      return '';
    }
  })();

  // Every escaping call travels over the shell's request/response channel.
  // The shell keys storage access by this window's own origin; an
  // identifier supplied by page code is never trusted.
  function invoke(operation, payload) {
    if (typeof window.__extbridgeInvoke === 'function') {
      return Promise.resolve(window.__extbridgeInvoke(operation, payload || {}));
    }
    return Promise.resolve(undefined);
  }

  // One async implementation, two calling conventions: a trailing
  // callback when provided, a promise otherwise.
  function adapt(promise, callback) {
    if (typeof callback === 'function') {
      promise.then(
        function (value) { callback(value); },
        function () { callback(undefined); }
      );
      return undefined;
    }
    return promise;
  }

  // --- URL match patterns, mirroring the platform's matcher ---

  function splitUrl(url) {
    var m = /^([a-zA-Z][a-zA-Z0-9+.\-]*):\/\/([^\/?#]*)([^#]*)/.exec(url);
    if (!m) { return null; }
    var host = m[2].toLowerCase();
    var colon = host.lastIndexOf(':');
    if (colon !== -1 && /^\d+$/.test(host.slice(colon + 1))) {
      host = host.slice(0, colon);
    }
    var rest = m[3] || '';
    return {
      scheme: m[1].toLowerCase(),
      host: host,
      path: rest.charAt(0) === '/' ? rest : '/' + rest
    };
  }

  function patternMatches(parts, pattern) {
    if (pattern === '<all_urls>') { return true; }
    if (!parts) { return false; }
    var sep = pattern.indexOf('://');
    if (sep === -1) { return false; }
    var scheme = pattern.slice(0, sep);
    if (['*', 'http', 'https', 'ftp', 'file'].indexOf(scheme) === -1) { return false; }
    var rest = pattern.slice(sep + 3);
    var slash = rest.indexOf('/');
    if (slash === -1) { return false; }
    var host = rest.slice(0, slash);
    var path = rest.slice(slash);

    if (scheme !== '*' && scheme !== parts.scheme) { return false; }
    if (host !== '*') {
      if (host.indexOf('*.') === 0) {
        var domain = host.slice(2).toLowerCase();
        if (parts.host !== domain &&
            parts.host.slice(-(domain.length + 1)) !== '.' + domain) {
          return false;
        }
      } else if (parts.host !== host.toLowerCase()) {
        return false;
      }
    }

    var expr = '^' +
      path.replace(/[.+?^${}()|[\]\\]/g, '\\$&').replace(/\*/g, '.*') +
      '$';
    return new RegExp(expr).test(parts.path);
  }

  function urlMatches(url, patterns) {
    var parts = splitUrl(url);
    for (var i = 0; i < patterns.length; i++) {
      if (patternMatches(parts, patterns[i])) { return true; }
    }
    return false;
  }

  // --- tabs ---

  var tabs = {
    query: function (info, callback) {
      info = info || {};
      var result = TABS.filter(function (tab) {
        if (typeof info.active === 'boolean' && tab.active !== info.active) {
          return false;
        }
        if (info.url) {
          var patterns = Array.isArray(info.url) ? info.url : [info.url];
          if (!urlMatches(tab.url, patterns)) { return false; }
        }
        return true;
      });
      return adapt(Promise.resolve(result), callback);
    },
    get: function (tabId, callback) {
      var found = TABS.filter(function (tab) { return tab.id === tabId; })[0];
      return adapt(Promise.resolve(found), callback);
    },
    create: function (props, callback) {
      return adapt(
        invoke('tabs.create', { url: (props && props.url) || 'about:blank' }),
        callback
      );
    },
    update: function (tabId, props, callback) {
      if (typeof tabId === 'object') {
        callback = props;
        props = tabId;
        var activeTab = TABS.filter(function (t) { return t.active; })[0];
        tabId = activeTab && activeTab.id;
      }
      return adapt(invoke('tabs.update', { id: tabId, props: props || {} }), callback);
    },
    remove: function (tabId, callback) {
      return adapt(invoke('tabs.remove', { id: tabId }), callback);
    },
    sendMessage: function (tabId, message, callback) {
      return adapt(invoke('tabs.sendMessage', { id: tabId, message: message }), callback);
    },
    executeScript: function (tabId, details, callback) {
      if (typeof tabId === 'object') {
        callback = details;
        details = tabId;
        tabId = undefined;
      }
      return adapt(invoke('tabs.executeScript', { id: tabId, details: details || {} }), callback);
    }
  };

  // --- storage: sync and managed alias local, no separate backend exists ---

  function storageArea() {
    return {
      get: function (keys, callback) {
        if (typeof keys === 'function') { callback = keys; keys = null; }
        return adapt(
          invoke('storage.get', { keys: keys === undefined ? null : keys }),
          callback
        );
      },
      set: function (items, callback) {
        return adapt(invoke('storage.set', { items: items || {} }), callback);
      },
      remove: function (keys, callback) {
        return adapt(
          invoke('storage.remove', { keys: Array.isArray(keys) ? keys : [keys] }),
          callback
        );
      },
      clear: function (callback) {
        return adapt(invoke('storage.clear', {}), callback);
      }
    };
  }
  var localArea = storageArea();
  var storage = { local: localArea, sync: localArea, managed: localArea };

  // --- windows: the shell has exactly one ---

  var WINDOW = {
    id: 1,
    focused: true,
    type: 'normal',
    state: 'maximized',
    alwaysOnTop: false,
    incognito: false
  };
  var windows = {
    getCurrent: function (getInfo, callback) {
      if (typeof getInfo === 'function') { callback = getInfo; }
      return adapt(Promise.resolve(WINDOW), callback);
    },
    getAll: function (getInfo, callback) {
      if (typeof getInfo === 'function') { callback = getInfo; }
      return adapt(Promise.resolve([WINDOW]), callback);
    }
  };

  // --- browsingData: clearing is delegated to browser chrome ---

  var browsingData = {
    remove: function (options, dataToRemove, callback) {
      return adapt(invoke('browsing-data.clear', { flags: dataToRemove || {} }), callback);
    },
    removeCache: function (options, callback) {
      return adapt(invoke('browsing-data.clear', { flags: { cache: true } }), callback);
    },
    removeCookies: function (options, callback) {
      return adapt(invoke('browsing-data.clear', { flags: { cookies: true } }), callback);
    },
    removeHistory: function (options, callback) {
      return adapt(invoke('browsing-data.clear', { flags: { history: true } }), callback);
    }
  };

  // --- notifications: native when permitted, silent otherwise ---

  var notificationSerial = 0;

  var notifications = {
    create: function (notificationId, options, callback) {
      if (typeof notificationId === 'object') {
        callback = options;
        options = notificationId;
        notificationSerial += 1;
        notificationId = 'notification-' + notificationSerial;
      }
      options = options || {};
      try {
        if (window.Notification && Notification.permission === 'granted') {
          new Notification(options.title || '', {
            body: options.message || '',
            icon: options.iconUrl
          });
          return adapt(Promise.resolve(notificationId), callback);
        }
      } catch (e) {
        // fall through to the shell
      }
      // No native capability here: the shell shows it when the manifest
      // permits, and drops it silently otherwise
      return adapt(
        invoke('notifications.create', { id: notificationId, options: options })
          .then(function () { return notificationId; }),
        callback
      );
    }
  };

  // --- i18n: identity passthrough, no localization ---

  var i18n = {
    getMessage: function (messageName) { return messageName; },
    getUILanguage: function () { return navigator.language || 'en'; }
  };

  // --- management ---

  var management = {
    getSelf: function (callback) {
      return adapt(Promise.resolve({
        id: EXTENSION_ID,
        name: document.title || EXTENSION_ID,
        enabled: true,
        installType: 'development',
        type: 'extension'
      }), callback);
    }
  };

  window.chrome = Object.assign(window.chrome || {}, {
    tabs: tabs,
    storage: storage,
    windows: windows,
    browsingData: browsingData,
    notifications: notifications,
    i18n: i18n,
    management: management
  });
  if (typeof window.browser === 'undefined') {
    window.browser = window.chrome;
  }
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TabStatus;

    fn tab(id: &str, url: &str, active: bool) -> Tab {
        Tab {
            id: id.to_string(),
            url: url.to_string(),
            title: String::new(),
            active,
            window_id: "main".to_string(),
            index: 0,
            favicon_url: None,
            status: TabStatus::Complete,
            incognito: false,
        }
    }

    #[test]
    fn snapshot_is_embedded_as_json() {
        let shim = generate(&[tab("t1", "https://example.com/", true)]);

        assert!(!shim.contains(SNAPSHOT_PLACEHOLDER));

        let start = shim.find("var TABS = ").unwrap() + "var TABS = ".len();
        let end = shim[start..].find(";\n").unwrap() + start;
        let snapshot: Vec<Tab> = serde_json::from_str(&shim[start..end]).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "t1");
    }

    #[test]
    fn empty_snapshot_renders_empty_array() {
        let shim = generate(&[]);
        assert!(shim.contains("var TABS = []"));
    }

    #[test]
    fn namespace_guard_comes_before_definitions() {
        let shim = generate(&[]);
        let guard = shim.find("if (window.chrome && window.chrome.tabs)").unwrap();
        let definition = shim.find("window.chrome = Object.assign").unwrap();
        assert!(guard < definition);
    }

    #[test]
    fn emulated_namespaces_are_all_present() {
        let shim = generate(&[]);
        for namespace in [
            "tabs:", "storage:", "windows:", "browsingData:", "notifications:", "i18n:",
            "management:",
        ] {
            assert!(shim.contains(namespace), "missing {}", namespace);
        }
        // sync and managed alias local
        assert!(shim.contains("{ local: localArea, sync: localArea, managed: localArea }"));
    }
}
