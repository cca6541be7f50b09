//! `alloy` bindings for the batch relayer contracts.

::alloy::sol! {
    #![sol(all_derives)]

    /// A single leg of a vault batch swap. `amount` may hold a chained
    /// reference when the call is executed through the relayer.
    struct BatchSwapStep {
        bytes32 poolId;
        uint256 assetInIndex;
        uint256 assetOutIndex;
        uint256 amount;
        bytes userData;
    }

    struct FundManagement {
        address sender;
        bool fromInternalBalance;
        address recipient;
        bool toInternalBalance;
    }

    struct JoinPoolRequest {
        address[] assets;
        uint256[] maxAmountsIn;
        bytes userData;
        bool fromInternalBalance;
    }

    struct ExitPoolRequest {
        address[] assets;
        uint256[] minAmountsOut;
        bytes userData;
        bool toInternalBalance;
    }

    /// Stores the vault delta at `index` under the chained reference `key`.
    struct OutputReference {
        uint256 index;
        uint256 key;
    }

    interface BatchRelayerLibrary {
        function setRelayerApproval(
            address relayer,
            bool approved,
            bytes authorisation
        ) external payable;

        function exitPool(
            bytes32 poolId,
            uint8 kind,
            address sender,
            address recipient,
            ExitPoolRequest request,
            OutputReference[] outputReferences
        ) external payable;

        function joinPool(
            bytes32 poolId,
            uint8 kind,
            address sender,
            address recipient,
            JoinPoolRequest request,
            uint256 value,
            uint256 outputReference
        ) external payable;

        function batchSwap(
            uint8 kind,
            BatchSwapStep[] swaps,
            address[] assets,
            FundManagement funds,
            int256[] limits,
            uint256 deadline,
            uint256 value,
            OutputReference[] outputReferences
        ) external payable returns (int256[] assetDeltas);

        function unwrapAaveStaticToken(
            address staticToken,
            address sender,
            address recipient,
            uint256 amount,
            bool toUnderlying,
            uint256 outputReference
        ) external payable;

        function unwrapERC4626(
            address wrappedToken,
            address sender,
            address recipient,
            uint256 amount,
            uint256 outputReference
        ) external payable;

        function unwrapEuler(
            address wrappedToken,
            address sender,
            address recipient,
            uint256 amount,
            uint256 outputReference
        ) external payable;

        function unwrapGearbox(
            address dieselToken,
            address sender,
            address recipient,
            uint256 dieselAmount,
            uint256 outputReference
        ) external payable;

        function unwrapReaperVaultToken(
            address vaultToken,
            address sender,
            address recipient,
            uint256 amount,
            uint256 outputReference
        ) external payable;

        function unwrapTetu(
            address wrappedToken,
            address sender,
            address recipient,
            uint256 amount,
            uint256 outputReference
        ) external payable;

        function unwrapYearn(
            address wrappedToken,
            address sender,
            address recipient,
            uint256 amount,
            uint256 outputReference
        ) external payable;
    }

    interface BalancerRelayer {
        function multicall(bytes[] data) external payable returns (bytes[] results);
    }
}
